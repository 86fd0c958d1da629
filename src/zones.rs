//! Zone classification
//!
//! Maps instantaneous heart rate, power and pace samples onto discrete zones
//! derived from a single threshold value, and accumulates time-in-zone
//! distributions over a recording.
//!
//! Pace zones are inverted: a higher sec/km value is a slower sample and
//! therefore a lower-intensity zone.

use serde::{Deserialize, Serialize};

/// Consecutive samples further apart than this are a sensor gap
pub const MAX_SAMPLE_GAP_SECONDS: f64 = 30.0;

/// Below this velocity (m/s) a sample has no meaningful pace
pub const MIN_PACE_VELOCITY: f64 = 0.5;

/// HR boundaries relative to max HR
const HR_ZONE_RATIOS: [f64; 4] = [0.60, 0.70, 0.80, 0.90];

/// Power boundaries relative to FTP
const POWER_ZONE_RATIOS: [f64; 5] = [0.55, 0.75, 0.90, 1.05, 1.20];

/// Pace boundaries relative to easy pace, slowest first
const PACE_ZONE_RATIOS: [f64; 4] = [1.15, 1.00, 0.88, 0.82];

/// ---------------------------------------------------------------------------
/// Zone Types
/// ---------------------------------------------------------------------------

/// Common behaviour of the discipline-specific zone enums
pub trait Zone: Copy + Eq + std::fmt::Debug + Serialize + Sized + 'static {
  /// Every zone, lowest intensity first
  const ALL: &'static [Self];

  /// 1-based zone number
  fn number(self) -> u8;

  fn as_str(self) -> &'static str;

  /// Index into a five-bucket intensity profile. Zones above 5 fold into
  /// the top bucket.
  fn compliance_bucket(self) -> usize {
    (self.number() as usize - 1).min(4)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HrZone {
  Z1, // Recovery: < 60% max
  Z2, // Aerobic: 60-70% max
  Z3, // Tempo: 70-80% max
  Z4, // Threshold: 80-90% max
  Z5, // VO2max: > 90% max
}

impl HrZone {
  pub fn from_hr(hr: f64, max_hr: f64) -> Self {
    Self::ALL[ascending_index(hr, &hr_boundaries(max_hr))]
  }
}

impl Zone for HrZone {
  const ALL: &'static [Self] = &[HrZone::Z1, HrZone::Z2, HrZone::Z3, HrZone::Z4, HrZone::Z5];

  fn number(self) -> u8 {
    self as u8 + 1
  }

  fn as_str(self) -> &'static str {
    match self {
      HrZone::Z1 => "Z1",
      HrZone::Z2 => "Z2",
      HrZone::Z3 => "Z3",
      HrZone::Z4 => "Z4",
      HrZone::Z5 => "Z5",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerZone {
  Z1, // Active recovery: < 55% FTP
  Z2, // Endurance: 55-75%
  Z3, // Tempo: 75-90%
  Z4, // Threshold: 90-105%
  Z5, // VO2max: 105-120%
  Z6, // Anaerobic: > 120%
}

impl PowerZone {
  pub fn from_watts(watts: f64, ftp: f64) -> Self {
    Self::ALL[ascending_index(watts, &power_boundaries(ftp))]
  }
}

impl Zone for PowerZone {
  const ALL: &'static [Self] = &[
    PowerZone::Z1,
    PowerZone::Z2,
    PowerZone::Z3,
    PowerZone::Z4,
    PowerZone::Z5,
    PowerZone::Z6,
  ];

  fn number(self) -> u8 {
    self as u8 + 1
  }

  fn as_str(self) -> &'static str {
    match self {
      PowerZone::Z1 => "Z1",
      PowerZone::Z2 => "Z2",
      PowerZone::Z3 => "Z3",
      PowerZone::Z4 => "Z4",
      PowerZone::Z5 => "Z5",
      PowerZone::Z6 => "Z6",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaceZone {
  Z1, // Recovery: slower than 115% of easy pace
  Z2, // Easy: 100-115%
  Z3, // Steady: 88-100%
  Z4, // Threshold: 82-88%
  Z5, // Fast: quicker than 82%
}

impl PaceZone {
  pub fn from_pace(sec_per_km: f64, easy_pace: f64) -> Self {
    Self::ALL[descending_index(sec_per_km, &pace_boundaries(easy_pace))]
  }
}

impl Zone for PaceZone {
  const ALL: &'static [Self] = &[PaceZone::Z1, PaceZone::Z2, PaceZone::Z3, PaceZone::Z4, PaceZone::Z5];

  fn number(self) -> u8 {
    self as u8 + 1
  }

  fn as_str(self) -> &'static str {
    match self {
      PaceZone::Z1 => "Z1",
      PaceZone::Z2 => "Z2",
      PaceZone::Z3 => "Z3",
      PaceZone::Z4 => "Z4",
      PaceZone::Z5 => "Z5",
    }
  }
}

/// ---------------------------------------------------------------------------
/// Boundaries
/// ---------------------------------------------------------------------------

pub fn hr_boundaries(max_hr: f64) -> [f64; 4] {
  HR_ZONE_RATIOS.map(|r| r * max_hr)
}

pub fn power_boundaries(ftp: f64) -> [f64; 5] {
  POWER_ZONE_RATIOS.map(|r| r * ftp)
}

/// Pace boundaries in sec/km, slowest first
pub fn pace_boundaries(easy_pace: f64) -> [f64; 4] {
  PACE_ZONE_RATIOS.map(|r| r * easy_pace)
}

/// Value below boundary `i` lands in zone `i`
fn ascending_index(value: f64, boundaries: &[f64]) -> usize {
  boundaries
    .iter()
    .position(|b| value < *b)
    .unwrap_or(boundaries.len())
}

/// Value at or above (slower than) boundary `i` lands in zone `i`
fn descending_index(value: f64, boundaries: &[f64]) -> usize {
  boundaries
    .iter()
    .position(|b| value >= *b)
    .unwrap_or(boundaries.len())
}

/// A zone's value range, used for the plan zone tables.
/// `lower` is inclusive, `upper` exclusive; `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBand {
  pub zone: u8,
  pub lower: Option<f64>,
  pub upper: Option<f64>,
}

fn ascending_bands(boundaries: &[f64]) -> Vec<ZoneBand> {
  (0..=boundaries.len())
    .map(|i| ZoneBand {
      zone: i as u8 + 1,
      lower: if i == 0 { None } else { Some(boundaries[i - 1]) },
      upper: boundaries.get(i).copied(),
    })
    .collect()
}

pub fn hr_zone_bands(max_hr: f64) -> Vec<ZoneBand> {
  ascending_bands(&hr_boundaries(max_hr))
}

pub fn power_zone_bands(ftp: f64) -> Vec<ZoneBand> {
  ascending_bands(&power_boundaries(ftp))
}

/// Pace bands in sec/km. Zone 1 has no upper (slowest) bound.
pub fn pace_zone_bands(easy_pace: f64) -> Vec<ZoneBand> {
  let b = pace_boundaries(easy_pace);
  (0..=b.len())
    .map(|i| ZoneBand {
      zone: i as u8 + 1,
      lower: b.get(i).copied(),
      upper: if i == 0 { None } else { Some(b[i - 1]) },
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Time-in-Zone Distribution
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTime<Z> {
  pub zone: Z,
  pub seconds: f64,
  /// Share of total valid time, 0-100
  pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDistribution<Z> {
  pub zones: Vec<ZoneTime<Z>>,
  pub total_seconds: f64,
}

impl<Z: Zone> ZoneDistribution<Z> {
  /// Accumulate elapsed time per zone over consecutive sample pairs.
  ///
  /// The interval ending at sample `i` is credited to the zone of `values[i]`.
  /// Pairs with a non-positive or > 30s time delta are skipped, as are samples
  /// for which `classify` returns `None`. With no valid time every zone
  /// reports 0%.
  pub fn from_samples<F>(time: &[f64], values: &[f64], classify: F) -> Self
  where
    F: Fn(f64) -> Option<Z>,
  {
    let mut seconds = vec![0.0; Z::ALL.len()];
    let n = time.len().min(values.len());

    for i in 1..n {
      let dt = time[i] - time[i - 1];
      if dt <= 0.0 || dt > MAX_SAMPLE_GAP_SECONDS {
        continue;
      }
      if let Some(zone) = classify(values[i]) {
        seconds[zone.number() as usize - 1] += dt;
      }
    }

    let total_seconds: f64 = seconds.iter().sum();
    let zones = Z::ALL
      .iter()
      .zip(seconds)
      .map(|(&zone, secs)| ZoneTime {
        zone,
        seconds: secs,
        percent: if total_seconds > 0.0 {
          secs / total_seconds * 100.0
        } else {
          0.0
        },
      })
      .collect();

    Self {
      zones,
      total_seconds,
    }
  }

  pub fn percent(&self, zone: Z) -> f64 {
    self
      .zones
      .iter()
      .find(|z| z.zone == zone)
      .map_or(0.0, |z| z.percent)
  }

  pub fn total_percent(&self) -> f64 {
    self.zones.iter().map(|z| z.percent).sum()
  }

  pub fn has_time(&self) -> bool {
    self.total_seconds > 0.0
  }

  /// Percentages folded into five intensity buckets for compliance scoring
  pub fn buckets(&self) -> [f64; 5] {
    let mut buckets = [0.0; 5];
    for z in &self.zones {
      buckets[z.zone.compliance_bucket()] += z.percent;
    }
    buckets
  }
}

/// HR time-in-zone. Non-positive HR samples are ignored.
pub fn hr_zone_distribution(time: &[f64], heartrate: &[f64], max_hr: f64) -> ZoneDistribution<HrZone> {
  ZoneDistribution::from_samples(time, heartrate, |hr| {
    (hr > 0.0 && max_hr > 0.0).then(|| HrZone::from_hr(hr, max_hr))
  })
}

/// Power time-in-zone. Non-positive samples (coasting, dropouts) are ignored.
pub fn power_zone_distribution(time: &[f64], power: &[f64], ftp: f64) -> ZoneDistribution<PowerZone> {
  ZoneDistribution::from_samples(time, power, |watts| {
    (watts > 0.0 && ftp > 0.0).then(|| PowerZone::from_watts(watts, ftp))
  })
}

/// Pace time-in-zone from a velocity (m/s) channel. Samples at or below
/// 0.5 m/s are standing still and ignored.
pub fn pace_zone_distribution(time: &[f64], velocity: &[f64], easy_pace: f64) -> ZoneDistribution<PaceZone> {
  ZoneDistribution::from_samples(time, velocity, |v| {
    (v > MIN_PACE_VELOCITY && easy_pace > 0.0).then(|| PaceZone::from_pace(1000.0 / v, easy_pace))
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  fn seconds(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
  }

  #[test]
  fn test_hr_zones() {
    let max_hr = 190.0;
    assert_eq!(HrZone::from_hr(100.0, max_hr), HrZone::Z1); // 53%
    assert_eq!(HrZone::from_hr(120.0, max_hr), HrZone::Z2); // 63%
    assert_eq!(HrZone::from_hr(140.0, max_hr), HrZone::Z3); // 74%
    assert_eq!(HrZone::from_hr(165.0, max_hr), HrZone::Z4); // 87%
    assert_eq!(HrZone::from_hr(180.0, max_hr), HrZone::Z5); // 95%
  }

  #[test]
  fn test_boundary_value_moves_up_a_zone() {
    // Exactly 60% of max is no longer "below" the first boundary
    assert_eq!(HrZone::from_hr(120.0, 200.0), HrZone::Z2);
    assert_eq!(PowerZone::from_watts(110.0, 200.0), PowerZone::Z2);
  }

  #[test]
  fn test_power_zones() {
    let ftp = 250.0;
    assert_eq!(PowerZone::from_watts(100.0, ftp), PowerZone::Z1);
    assert_eq!(PowerZone::from_watts(160.0, ftp), PowerZone::Z2);
    assert_eq!(PowerZone::from_watts(200.0, ftp), PowerZone::Z3);
    assert_eq!(PowerZone::from_watts(250.0, ftp), PowerZone::Z4);
    assert_eq!(PowerZone::from_watts(280.0, ftp), PowerZone::Z5);
    assert_eq!(PowerZone::from_watts(400.0, ftp), PowerZone::Z6);
  }

  #[test]
  fn test_pace_zones_are_inverted() {
    let easy = 360.0; // 6:00/km
    assert_eq!(PaceZone::from_pace(450.0, easy), PaceZone::Z1); // slower than 414
    assert_eq!(PaceZone::from_pace(380.0, easy), PaceZone::Z2);
    assert_eq!(PaceZone::from_pace(330.0, easy), PaceZone::Z3);
    assert_eq!(PaceZone::from_pace(300.0, easy), PaceZone::Z4); // between 295.2 and 316.8
    assert_eq!(PaceZone::from_pace(280.0, easy), PaceZone::Z5); // faster than 295.2
  }

  #[test]
  fn test_distribution_sums_to_100() {
    let time = seconds(600);
    let hr: Vec<f64> = (0..600).map(|i| 100.0 + (i % 90) as f64).collect();
    let dist = hr_zone_distribution(&time, &hr, 190.0);
    assert!((dist.total_percent() - 100.0).abs() < 0.01);
    assert!((dist.total_seconds - 599.0).abs() < 1e-9);
  }

  #[test]
  fn test_distribution_all_zero_hr_reports_zero() {
    let time = seconds(100);
    let hr = vec![0.0; 100];
    let dist = hr_zone_distribution(&time, &hr, 190.0);
    assert_eq!(dist.total_seconds, 0.0);
    assert_eq!(dist.total_percent(), 0.0);
    assert_eq!(dist.zones.len(), 5);
  }

  #[test]
  fn test_distribution_skips_gaps_and_backwards_time() {
    // 10s of Z2, a 60s gap, a backwards step, then 10s of Z5
    let time = vec![0.0, 5.0, 10.0, 70.0, 65.0, 70.0, 75.0];
    let hr = vec![130.0, 130.0, 130.0, 180.0, 180.0, 180.0, 180.0];
    let dist = hr_zone_distribution(&time, &hr, 190.0);
    assert!((dist.total_seconds - 20.0).abs() < 1e-9);
    assert!((dist.percent(HrZone::Z2) - 50.0).abs() < 1e-9);
    assert!((dist.percent(HrZone::Z5) - 50.0).abs() < 1e-9);
  }

  #[test]
  fn test_pace_distribution_ignores_standing() {
    let time = seconds(11);
    let mut velocity = vec![3.0; 11];
    velocity[5] = 0.4;
    let dist = pace_zone_distribution(&time, &velocity, 360.0);
    assert!((dist.total_seconds - 9.0).abs() < 1e-9);
    // 3 m/s = 333 s/km -> Z3
    assert!((dist.percent(PaceZone::Z3) - 100.0).abs() < 1e-9);
  }

  #[test]
  fn test_power_distribution_ignores_coasting() {
    // Coasting for samples 0..5, then FTP; the intervals ending at 5..9 count
    let time = seconds(10);
    let mut power = vec![0.0; 5];
    power.extend(vec![200.0; 5]);
    let dist = power_zone_distribution(&time, &power, 200.0);
    assert!((dist.total_seconds - 5.0).abs() < 1e-9);
    assert!((dist.percent(PowerZone::Z4) - 100.0).abs() < 1e-9);
    assert_eq!(dist.percent(PowerZone::Z1), 0.0);
  }

  #[test]
  fn test_power_buckets_fold_z6() {
    let time = seconds(5);
    let power = vec![0.0, 400.0, 400.0, 100.0, 100.0];
    let dist = power_zone_distribution(&time, &power, 250.0);
    assert_eq!(dist.zones.len(), 6);
    let buckets = dist.buckets();
    assert!((buckets[4] - 50.0).abs() < 1e-9);
    assert!((buckets[0] - 50.0).abs() < 1e-9);
  }

  #[test]
  fn test_bands_cover_the_range() {
    let bands = power_zone_bands(200.0);
    assert_eq!(bands.len(), 6);
    assert_eq!(bands[0].lower, None);
    assert!((bands[0].upper.unwrap() - 110.0).abs() < 1e-9);
    assert!((bands[5].lower.unwrap() - 240.0).abs() < 1e-9);
    assert_eq!(bands[5].upper, None);

    let pace = pace_zone_bands(300.0);
    assert_eq!(pace.len(), 5);
    assert_eq!(pace[0].upper, None);
    assert!((pace[0].lower.unwrap() - 345.0).abs() < 1e-9);
    assert_eq!(pace[4].lower, None);
    assert!((pace[4].upper.unwrap() - 246.0).abs() < 1e-9);
  }
}
