//! Zone Breakthrough Detection
//!
//! Conservative confirmation of new threshold values. After each workout we
//! estimate candidate thresholds (FTP, LTHR, run threshold pace, swim CSS)
//! and only promote one once other recent workouts agree:
//!
//! - 1 detection in the lookback window: low confidence, logged only
//! - 2 detections: medium confidence, committed
//! - 3 or more: high confidence, committed
//!
//! There is no explicit reset. Old candidates simply age out of the window.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::BreakthroughPolicy;
use crate::locks::UserLocks;
use crate::metrics::{pace, power, swim};
use crate::models::{
    ActivitySummary, AthleteProfile, Breakthrough, BreakthroughCandidate, Confidence, Discipline,
    PlanZoneConfig, UserZones, ZoneKind, ZoneUpdate, THRESHOLD_TO_EASY_PACE,
};
use crate::store::{BreakthroughStore, ProfileStore, StoreError};
use crate::streams::StreamRecord;

/// Best-effort window used for FTP and LTHR estimates
const THRESHOLD_EFFORT_SECONDS: f64 = 1200.0;

/// 20-minute power (or ride HR) overestimates a one-hour threshold by ~5%
const TWENTY_MINUTE_TO_THRESHOLD: f64 = 0.95;

const RUN_MIN_DISTANCE_METERS: f64 = 3000.0;
const RUN_HARD_EFFORT_HR_FRACTION: f64 = 0.85;

// ---------------------------------------------------------------------------
/// Estimates
// ---------------------------------------------------------------------------

/// A threshold value suggested by one workout, before corroboration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEstimate {
    pub zone: ZoneKind,
    pub current_value: f64,
    pub detected_value: f64,
    /// Profile change to apply if the estimate is confirmed
    pub update: ZoneUpdate,
}

impl ZoneEstimate {
    /// Improvement in percent. Positive for more power or a faster pace.
    pub fn change_pct(&self) -> f64 {
        if self.current_value <= 0.0 {
            return 0.0;
        }
        let delta = if self.zone.lower_is_better() {
            self.current_value - self.detected_value
        } else {
            self.detected_value - self.current_value
        };
        delta / self.current_value * 100.0
    }
}

/// Every threshold this workout suggests an improvement for.
///
/// Bricks are treated as rides.
pub fn estimate_breakthroughs(
    discipline: Discipline,
    stream: Option<&StreamRecord>,
    summary: &ActivitySummary,
    zones: &UserZones,
    policy: &BreakthroughPolicy,
) -> Vec<ZoneEstimate> {
    let stream = stream.filter(|s| !s.is_empty());
    let mut estimates = Vec::new();

    match discipline {
        Discipline::Bike | Discipline::Brick => {
            if let Some(estimate) = stream.and_then(|s| estimate_ftp(s, zones, policy)) {
                estimates.push(estimate);
            }
            if let Some(estimate) =
                stream.and_then(|s| estimate_lthr(s, TWENTY_MINUTE_TO_THRESHOLD, zones, policy))
            {
                estimates.push(estimate);
            }
        }
        Discipline::Run => {
            if let Some(estimate) = estimate_run_threshold(stream, summary, zones, policy) {
                estimates.push(estimate);
            }
            if let Some(estimate) = stream.and_then(|s| estimate_lthr(s, 1.0, zones, policy)) {
                estimates.push(estimate);
            }
        }
        Discipline::Swim => {
            if let Some(estimate) = stream.and_then(|s| estimate_swim_css(s, zones, policy)) {
                estimates.push(estimate);
            }
        }
    }

    estimates
}

/// Best 20-minute power x 0.95
fn estimate_ftp(
    stream: &StreamRecord,
    zones: &UserZones,
    policy: &BreakthroughPolicy,
) -> Option<ZoneEstimate> {
    if !stream.has_power_data() {
        return None;
    }

    let best = power::best_average(&stream.time, &stream.power, THRESHOLD_EFFORT_SECONDS)?;
    let detected = (best * TWENTY_MINUTE_TO_THRESHOLD).round();
    let current = zones.ftp_watts;

    if detected < current * (1.0 + policy.ftp_min_gain) {
        return None;
    }

    Some(ZoneEstimate {
        zone: ZoneKind::Ftp,
        current_value: current,
        detected_value: detected,
        update: ZoneUpdate::Ftp { watts: detected },
    })
}

/// Best 20-minute average heart rate, scaled for the discipline. Never above
/// max HR.
fn estimate_lthr(
    stream: &StreamRecord,
    scale: f64,
    zones: &UserZones,
    policy: &BreakthroughPolicy,
) -> Option<ZoneEstimate> {
    if !stream.has_heart_rate_data() {
        return None;
    }

    let best = power::best_average(&stream.time, &stream.heartrate, THRESHOLD_EFFORT_SECONDS)?;
    let detected = (best * scale).round();
    let current = zones.lactate_threshold_hr;

    if detected < current * (1.0 + policy.lthr_min_gain) || detected > zones.max_hr {
        return None;
    }

    Some(ZoneEstimate {
        zone: ZoneKind::Lthr,
        current_value: current,
        detected_value: detected,
        update: ZoneUpdate::Lthr { bpm: detected },
    })
}

/// Threshold pace from a hard continuous run.
///
/// The run must cover 3 km and either average 85% of max HR or beat the
/// current threshold pace. Longer efforts are held at a slower pace than
/// threshold, so their pace is scaled down by distance band.
fn estimate_run_threshold(
    stream: Option<&StreamRecord>,
    summary: &ActivitySummary,
    zones: &UserZones,
    policy: &BreakthroughPolicy,
) -> Option<ZoneEstimate> {
    let distance = stream
        .map(|s| s.total_distance())
        .filter(|d| *d > 0.0)
        .or(summary.distance_meters)?;
    if distance < RUN_MIN_DISTANCE_METERS {
        return None;
    }

    let effort_pace = stream
        .and_then(pace::moving_pace)
        .or_else(|| summary.pace_sec_per_km())?;
    let average_hr = stream
        .and_then(|s| s.average_heart_rate())
        .or(summary.average_hr);

    let hard_by_hr = average_hr.is_some_and(|hr| hr >= zones.max_hr * RUN_HARD_EFFORT_HR_FRACTION);
    let faster_than_threshold = effort_pace < zones.threshold_pace_sec_per_km;
    if !hard_by_hr && !faster_than_threshold {
        return None;
    }

    let threshold = effort_pace * distance_band_multiplier(distance);
    let easy = threshold / THRESHOLD_TO_EASY_PACE;
    if easy > zones.easy_pace_sec_per_km * (1.0 - policy.run_pace_min_gain) {
        return None;
    }

    Some(ZoneEstimate {
        zone: ZoneKind::RunThreshold,
        current_value: zones.threshold_pace_sec_per_km,
        detected_value: threshold,
        update: ZoneUpdate::RunThreshold {
            threshold_pace_sec_per_km: threshold,
            easy_pace_sec_per_km: easy,
        },
    })
}

fn distance_band_multiplier(distance_meters: f64) -> f64 {
    match distance_meters {
        d if d <= 6000.0 => 1.0,
        d if d <= 12000.0 => 0.97,
        d if d <= 25000.0 => 0.93,
        _ => 0.88,
    }
}

/// CSS from the fastest structured intervals
fn estimate_swim_css(
    stream: &StreamRecord,
    zones: &UserZones,
    policy: &BreakthroughPolicy,
) -> Option<ZoneEstimate> {
    let intervals = swim::detect_intervals(stream);
    let css = swim::estimate_css(&intervals)?;
    let current = zones.swim_css_sec_per_100m;

    if css > current * (1.0 - policy.css_min_gain) {
        return None;
    }

    Some(ZoneEstimate {
        zone: ZoneKind::SwimCss,
        current_value: current,
        detected_value: css,
        update: ZoneUpdate::SwimCss { sec_per_100m: css },
    })
}

// ---------------------------------------------------------------------------
/// Confirmation
// ---------------------------------------------------------------------------

pub struct ZoneBreakthroughDetector<S> {
    store: Arc<S>,
    locks: UserLocks,
    policy: BreakthroughPolicy,
}

impl<S> ZoneBreakthroughDetector<S>
where
    S: ProfileStore + BreakthroughStore,
{
    pub fn new(store: Arc<S>, locks: UserLocks, policy: BreakthroughPolicy) -> Self {
        Self {
            store,
            locks,
            policy,
        }
    }

    /// Run detection for one completed workout.
    ///
    /// Returns one result per estimated threshold, low confidence included.
    /// Storage failures are logged and that zone is skipped; they never fail
    /// the caller.
    #[allow(clippy::too_many_arguments)]
    pub async fn detect_zone_breakthroughs(
        &self,
        user_id: i64,
        workout_id: i64,
        date: NaiveDate,
        discipline: Discipline,
        stream: Option<&StreamRecord>,
        summary: &ActivitySummary,
        zones: &UserZones,
    ) -> Vec<Breakthrough> {
        let estimates = estimate_breakthroughs(discipline, stream, summary, zones, &self.policy);
        if estimates.is_empty() {
            debug!(user_id, workout_id, "No threshold candidates in workout");
            return Vec::new();
        }

        let _guard = self.locks.lock(user_id).await;
        let detected_at = date.and_time(NaiveTime::MIN).and_utc();

        let mut results = Vec::new();
        for estimate in estimates {
            match self
                .confirm(user_id, workout_id, detected_at, zones, &estimate)
                .await
            {
                Ok(breakthrough) => results.push(breakthrough),
                Err(e) => warn!(
                    user_id,
                    workout_id,
                    zone = %estimate.zone,
                    error = %e,
                    "Breakthrough check failed, skipping"
                ),
            }
        }

        results
    }

    /// Count corroborating detections, record this one, commit when confident
    async fn confirm(
        &self,
        user_id: i64,
        workout_id: i64,
        detected_at: DateTime<Utc>,
        zones: &UserZones,
        estimate: &ZoneEstimate,
    ) -> Result<Breakthrough, StoreError> {
        // Same-day detections from other workouts corroborate too
        let since = detected_at - Duration::days(self.policy.lookback_days);
        let until = detected_at + Duration::days(1);

        let prior = self
            .store
            .count_candidates(user_id, estimate.zone, since, until, workout_id)
            .await?;

        self.store
            .record_candidate(
                user_id,
                &BreakthroughCandidate {
                    zone: estimate.zone,
                    detected_value: estimate.detected_value,
                    detected_at,
                    workout_id,
                },
            )
            .await?;

        let count = prior + 1;
        let confidence = Confidence::from_count(count);
        let auto_committed = confidence.commits();

        if auto_committed {
            self.commit(user_id, zones, &estimate.update).await?;
            info!(
                user_id,
                zone = %estimate.zone,
                from = estimate.current_value,
                to = estimate.detected_value,
                count,
                "Zone breakthrough committed"
            );
        }

        Ok(Breakthrough {
            zone: estimate.zone,
            current_value: estimate.current_value,
            detected_value: estimate.detected_value,
            change_pct: estimate.change_pct(),
            confidence,
            corroboration_count: count,
            message: describe(estimate, count, auto_committed, self.policy.lookback_days),
            auto_committed,
        })
    }

    /// Write the new value to the profile and rebuild the plan's zone table.
    /// A user without a stored profile starts from the zones the workout was
    /// analyzed against.
    async fn commit(
        &self,
        user_id: i64,
        zones: &UserZones,
        update: &ZoneUpdate,
    ) -> Result<(), StoreError> {
        let mut profile = match self.store.get_profile(user_id).await? {
            Some(profile) => profile,
            None => AthleteProfile::from_zones(zones),
        };
        update.apply_to(&mut profile);
        self.store.save_profile(user_id, &profile).await?;

        let mut config = match self.store.get_plan_zone_config(user_id).await? {
            Some(config) => config,
            None => PlanZoneConfig::from_zones(&UserZones::derive(&profile)),
        };
        config.apply(update);
        self.store.save_plan_zone_config(user_id, &config).await
    }
}

// ---------------------------------------------------------------------------
/// Messages
// ---------------------------------------------------------------------------

fn describe(estimate: &ZoneEstimate, count: u32, committed: bool, lookback_days: i64) -> String {
    let name = match estimate.zone {
        ZoneKind::Ftp => "FTP",
        ZoneKind::Lthr => "Threshold heart rate",
        ZoneKind::RunThreshold => "Run threshold pace",
        ZoneKind::SwimCss => "Critical swim speed",
    };
    let current = format_value(estimate.zone, estimate.current_value);
    let detected = format_value(estimate.zone, estimate.detected_value);

    if committed {
        format!(
            "{} updated from {} to {} after {} matching workouts in the last {} days",
            name, current, detected, count, lookback_days
        )
    } else {
        format!(
            "{} may have improved to {} (currently {}, {:+.1}%). One more matching workout within {} days will confirm it",
            name,
            detected,
            current,
            estimate.change_pct(),
            lookback_days
        )
    }
}

fn format_value(zone: ZoneKind, value: f64) -> String {
    match zone {
        ZoneKind::Ftp => format!("{:.0} W", value),
        ZoneKind::Lthr => format!("{:.0} bpm", value),
        ZoneKind::RunThreshold => format!("{}/km", format_pace(value)),
        ZoneKind::SwimCss => format!("{}/100m", format_pace(value)),
    }
}

fn format_pace(seconds: f64) -> String {
    let total = seconds.round() as i64;
    format!("{}:{:02}", total / 60, total % 60)
}
