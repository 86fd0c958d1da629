//! Per-workout analysis
//!
//! Picks the calculators that apply to a discipline and assembles one
//! `WorkoutAnalytics` record. When no stream is available the summary
//! fields (moving time, distance, averages) stand in for the stream-derived
//! metrics.

use tracing::debug;

use crate::metrics::compliance::{score_distribution, ComplianceScore, ComplianceSource};
use crate::metrics::load::{self, StressScore};
use crate::metrics::{heart_rate, pace, power, swim, terrain};
use crate::models::{
  ActivitySummary, Discipline, PrescribedIntensity, TssMethod, UserZones, WorkoutAnalytics,
};
use crate::streams::StreamRecord;
use crate::zones::{hr_zone_distribution, pace_zone_distribution, power_zone_distribution};

/// Analyze one completed workout.
///
/// Brick sessions are analyzed as a ride; the record keeps the brick
/// discipline.
pub fn analyze_workout(
  discipline: Discipline,
  stream: Option<&StreamRecord>,
  summary: &ActivitySummary,
  zones: &UserZones,
  prescribed: Option<PrescribedIntensity>,
) -> WorkoutAnalytics {
  let stream = stream.filter(|s| !s.is_empty());
  let mut analytics = WorkoutAnalytics::empty(discipline);
  apply_common(&mut analytics, stream, summary, zones);

  match discipline {
    Discipline::Run => analyze_run(&mut analytics, stream, summary, zones),
    Discipline::Bike | Discipline::Brick => analyze_ride(&mut analytics, stream, summary, zones),
    Discipline::Swim => analyze_swim(&mut analytics, stream, summary, zones),
  }

  if analytics.tss.is_none() {
    let hr_stress = match (analytics.duration_seconds, analytics.average_hr) {
      (Some(duration), Some(hr)) => load::heart_rate_stress(duration, hr, zones.lactate_threshold_hr),
      _ => None,
    };
    set_stress(&mut analytics, hr_stress, TssMethod::HeartRate);
  }

  if let Some(intensity) = prescribed {
    analytics.compliance = score_compliance(&analytics, intensity);
  }

  debug!(
    discipline = %discipline,
    has_stream = stream.is_some(),
    tss = ?analytics.tss,
    method = ?analytics.tss_method,
    "Workout analyzed"
  );

  analytics
}

/// ---------------------------------------------------------------------------
/// Shared Metrics
/// ---------------------------------------------------------------------------

fn apply_common(
  analytics: &mut WorkoutAnalytics,
  stream: Option<&StreamRecord>,
  summary: &ActivitySummary,
  zones: &UserZones,
) {
  // Moving time drives TSS; stream duration includes pauses
  analytics.duration_seconds = summary
    .duration_seconds()
    .or_else(|| stream.map(|s| s.duration_seconds()).filter(|d| *d > 0.0));

  analytics.distance_meters = stream
    .map(|s| s.total_distance())
    .filter(|d| *d > 0.0)
    .or(summary.distance_meters.filter(|d| *d > 0.0));

  analytics.average_hr = stream
    .and_then(|s| s.average_heart_rate())
    .or(summary.average_hr.filter(|hr| *hr > 0.0));

  let Some(stream) = stream else {
    return;
  };

  if stream.has_heart_rate_data() {
    let distribution = hr_zone_distribution(&stream.time, &stream.heartrate, zones.max_hr);
    analytics.hr_zones = distribution.has_time().then_some(distribution);
    analytics.trimp = heart_rate::trimp(
      &stream.time,
      &stream.heartrate,
      zones.max_hr,
      zones.resting_hr,
      zones.sex,
    );
  }

  analytics.cadence = terrain::cadence_stats(&stream.cadence);
  if stream.has_altitude_data() {
    analytics.elevation = terrain::elevation(&stream.altitude);
  }
}

fn set_stress(analytics: &mut WorkoutAnalytics, score: Option<StressScore>, method: TssMethod) {
  if let Some(score) = score {
    analytics.tss = Some(score.tss);
    analytics.intensity_factor = Some(score.intensity_factor);
    analytics.tss_method = Some(method);
  }
}

/// ---------------------------------------------------------------------------
/// Run
/// ---------------------------------------------------------------------------

fn analyze_run(
  analytics: &mut WorkoutAnalytics,
  stream: Option<&StreamRecord>,
  summary: &ActivitySummary,
  zones: &UserZones,
) {
  if let Some(stream) = stream {
    let velocity = stream.velocity_or_derived();

    let distribution = pace_zone_distribution(&stream.time, &velocity, zones.easy_pace_sec_per_km);
    analytics.pace_zones = distribution.has_time().then_some(distribution);

    analytics.normalized_graded_pace_sec_per_km = pace::grade_adjusted_pace(stream);
    analytics.average_pace_sec_per_km = pace::moving_pace(stream);
    analytics.splits = terrain::splits(stream);
    analytics.aerobic_decoupling_pct =
      heart_rate::aerobic_decoupling(&stream.time, &stream.heartrate, &velocity);
  }

  let summary_pace = summary.pace_sec_per_km();
  analytics.average_pace_sec_per_km = analytics.average_pace_sec_per_km.or(summary_pace);
  analytics.normalized_graded_pace_sec_per_km =
    analytics.normalized_graded_pace_sec_per_km.or(summary_pace);

  if let Some(ngp) = analytics.normalized_graded_pace_sec_per_km {
    // speed in m/min per beat
    let speed = pace::pace_to_speed(ngp).map_or(0.0, |v| v * 60.0);
    analytics.efficiency_factor = analytics
      .average_hr
      .and_then(|hr| heart_rate::efficiency_factor(speed, hr));

    let stress = analytics
      .duration_seconds
      .and_then(|d| load::running_stress(d, ngp, zones.threshold_pace_sec_per_km));
    set_stress(analytics, stress, TssMethod::Pace);
  }
}

/// ---------------------------------------------------------------------------
/// Ride
/// ---------------------------------------------------------------------------

fn analyze_ride(
  analytics: &mut WorkoutAnalytics,
  stream: Option<&StreamRecord>,
  summary: &ActivitySummary,
  zones: &UserZones,
) {
  if let Some(stream) = stream {
    if stream.has_power_data() {
      let distribution = power_zone_distribution(&stream.time, &stream.power, zones.ftp_watts);
      analytics.power_zones = distribution.has_time().then_some(distribution);
      analytics.normalized_power = power::normalized_power(&stream.power);
      analytics.average_power = stream.average_power();
      analytics.aerobic_decoupling_pct =
        heart_rate::aerobic_decoupling(&stream.time, &stream.heartrate, &stream.power);
    }
    analytics.splits = terrain::splits(stream);
  }

  let summary_watts = summary.average_watts.filter(|w| *w > 0.0);
  analytics.average_power = analytics.average_power.or(summary_watts);
  // Without a power stream the average is the best estimate of NP
  analytics.normalized_power = analytics.normalized_power.or(summary_watts);

  if let Some(np) = analytics.normalized_power {
    analytics.variability_index = analytics
      .average_power
      .and_then(|avg| power::variability_index(np, avg));
    analytics.efficiency_factor = analytics
      .average_hr
      .and_then(|hr| heart_rate::efficiency_factor(np, hr));

    let stress = analytics
      .duration_seconds
      .and_then(|d| load::cycling_stress(d, np, zones.ftp_watts));
    set_stress(analytics, stress, TssMethod::Power);
  }
}

/// ---------------------------------------------------------------------------
/// Swim
/// ---------------------------------------------------------------------------

fn analyze_swim(
  analytics: &mut WorkoutAnalytics,
  stream: Option<&StreamRecord>,
  summary: &ActivitySummary,
  zones: &UserZones,
) {
  if let Some(stream) = stream {
    analytics.swim_intervals = swim::detect_intervals(stream);
    analytics.swim_pace_sec_per_100m = swim::average_interval_pace(&analytics.swim_intervals);
    analytics.estimated_css_sec_per_100m = swim::estimate_css(&analytics.swim_intervals);
  }

  analytics.swim_pace_sec_per_100m = analytics
    .swim_pace_sec_per_100m
    .or_else(|| summary.pace_sec_per_100m());

  if let Some(pace) = analytics.swim_pace_sec_per_100m {
    let stress = analytics
      .duration_seconds
      .and_then(|d| load::swim_stress(d, pace, zones.swim_css_sec_per_100m));
    set_stress(analytics, stress, TssMethod::SwimPace);
  }
}

/// ---------------------------------------------------------------------------
/// Compliance
/// ---------------------------------------------------------------------------

/// Score against HR zones when present, otherwise pace, otherwise power
fn score_compliance(
  analytics: &WorkoutAnalytics,
  intensity: PrescribedIntensity,
) -> Option<ComplianceScore> {
  if let Some(hr) = &analytics.hr_zones {
    return score_distribution(hr, intensity, ComplianceSource::HeartRate);
  }
  if let Some(pace) = &analytics.pace_zones {
    return score_distribution(pace, intensity, ComplianceSource::Pace);
  }
  analytics
    .power_zones
    .as_ref()
    .and_then(|power| score_distribution(power, intensity, ComplianceSource::Power))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::AthleteProfile;
  use crate::test_utils::{mock_user_zones, ride_stream, run_stream, swim_stream};

  #[test]
  fn test_summary_only_ride_at_ftp() {
    // Arrange
    let zones = UserZones {
      ftp_watts: 250.0,
      ..mock_user_zones()
    };
    let summary = ActivitySummary {
      moving_time_seconds: Some(3600),
      average_watts: Some(250.0),
      average_hr: Some(150.0),
      ..Default::default()
    };

    // Act
    let analytics = analyze_workout(Discipline::Bike, None, &summary, &zones, None);

    // Assert
    assert_eq!(analytics.intensity_factor, Some(1.0));
    assert!((analytics.tss.unwrap() - 100.0).abs() < 1e-9);
    assert_eq!(analytics.tss_method, Some(TssMethod::Power));
    assert!((analytics.efficiency_factor.unwrap() - 250.0 / 150.0).abs() < 1e-9);
    assert!(analytics.power_zones.is_none());
  }

  #[test]
  fn test_ride_stream_metrics() {
    let zones = mock_user_zones();
    let stream = ride_stream(3600, 200.0, 140.0);
    let summary = ActivitySummary {
      moving_time_seconds: Some(3600),
      ..Default::default()
    };

    let analytics = analyze_workout(Discipline::Bike, Some(&stream), &summary, &zones, None);

    assert!((analytics.normalized_power.unwrap() - 200.0).abs() < 1e-6);
    assert!((analytics.variability_index.unwrap() - 1.0).abs() < 1e-6);
    assert!(analytics.power_zones.as_ref().unwrap().has_time());
    assert!(analytics.hr_zones.is_some());
    assert!(analytics.trimp.is_some());
    assert!(analytics.aerobic_decoupling_pct.unwrap().abs() < 1e-9);
    // 200W against 250W FTP for an hour: IF 0.8, TSS 64
    assert!((analytics.tss.unwrap() - 64.0).abs() < 1e-6);
  }

  #[test]
  fn test_run_stream_metrics() {
    let zones = mock_user_zones();
    let stream = run_stream(1800, 3.5, 150.0, Some(50.0));
    let summary = ActivitySummary::default();

    let analytics = analyze_workout(
      Discipline::Run,
      Some(&stream),
      &summary,
      &zones,
      Some(PrescribedIntensity::Easy),
    );

    assert!(analytics.pace_zones.is_some());
    assert_eq!(analytics.splits.len(), 6);
    let ngp = analytics.normalized_graded_pace_sec_per_km.unwrap();
    assert!((ngp - 1000.0 / 3.5).abs() < 0.01);
    assert_eq!(analytics.tss_method, Some(TssMethod::Pace));
    assert_eq!(analytics.elevation.unwrap().ascent_meters, 0.0);
    assert_eq!(
      analytics.compliance.as_ref().unwrap().source,
      ComplianceSource::HeartRate
    );
  }

  #[test]
  fn test_hr_only_run_falls_back_to_hr_tss() {
    // Treadmill without a footpod: heart rate only
    let zones = mock_user_zones();
    let mut stream = run_stream(1800, 0.0, 150.0, None);
    stream.velocity.clear();
    stream.distance.clear();

    let analytics =
      analyze_workout(Discipline::Run, Some(&stream), &ActivitySummary::default(), &zones, None);

    assert!(analytics.hr_zones.is_some());
    assert!(analytics.trimp.is_some());
    assert!(analytics.pace_zones.is_none());
    assert!(analytics.normalized_graded_pace_sec_per_km.is_none());
    assert_eq!(analytics.tss_method, Some(TssMethod::HeartRate));
    assert!(analytics.tss.unwrap() > 0.0);
  }

  #[test]
  fn test_summary_only_run() {
    let zones = UserZones::derive(&AthleteProfile {
      threshold_pace_sec_per_km: Some(300.0),
      ..Default::default()
    });
    let summary = ActivitySummary {
      distance_meters: Some(10000.0),
      moving_time_seconds: Some(3000),
      ..Default::default()
    };

    let analytics = analyze_workout(Discipline::Run, None, &summary, &zones, None);

    assert_eq!(analytics.average_pace_sec_per_km, Some(300.0));
    assert_eq!(analytics.intensity_factor, Some(1.0));
    assert!((analytics.tss.unwrap() - 3000.0 / (300.0 * 36.0)).abs() < 1e-9);
    assert!(analytics.efficiency_factor.is_none());
  }

  #[test]
  fn test_swim_uses_intervals() {
    let zones = UserZones {
      swim_css_sec_per_100m: 100.0,
      ..mock_user_zones()
    };
    let stream = swim_stream(&[(100.0, 90, 15), (100.0, 88, 15), (100.0, 95, 0)]);

    let analytics =
      analyze_workout(Discipline::Swim, Some(&stream), &ActivitySummary::default(), &zones, None);

    assert_eq!(analytics.swim_intervals.len(), 3);
    assert!((analytics.estimated_css_sec_per_100m.unwrap() - 91.0).abs() < 1e-6);
    assert_eq!(analytics.tss_method, Some(TssMethod::SwimPace));
    assert!(analytics.pace_zones.is_none());
  }

  #[test]
  fn test_brick_is_analyzed_as_ride() {
    let zones = mock_user_zones();
    let stream = ride_stream(1800, 250.0, 150.0);

    let analytics =
      analyze_workout(Discipline::Brick, Some(&stream), &ActivitySummary::default(), &zones, None);

    assert_eq!(analytics.discipline, Discipline::Brick);
    assert!(analytics.normalized_power.is_some());
    assert_eq!(analytics.tss_method, Some(TssMethod::Power));
  }

  #[test]
  fn test_compliance_uses_power_without_hr() {
    let zones = mock_user_zones();
    let mut stream = ride_stream(1800, 150.0, 0.0);
    stream.heartrate.clear();

    let analytics = analyze_workout(
      Discipline::Bike,
      Some(&stream),
      &ActivitySummary::default(),
      &zones,
      Some(PrescribedIntensity::Easy),
    );

    assert!(analytics.hr_zones.is_none());
    let compliance = analytics.compliance.unwrap();
    assert_eq!(compliance.source, ComplianceSource::Power);
    // 60% of FTP is Z2: |20| + |35| + |12| + |3| = 70
    assert!((compliance.score - 65.0).abs() < 1e-9);
  }

  #[test]
  fn test_nothing_to_analyze() {
    let analytics = analyze_workout(
      Discipline::Run,
      None,
      &ActivitySummary::default(),
      &mock_user_zones(),
      Some(PrescribedIntensity::Hard),
    );

    assert!(analytics.tss.is_none());
    assert!(analytics.compliance.is_none());
    assert!(analytics.splits.is_empty());
  }
}
