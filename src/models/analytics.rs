use serde::{Deserialize, Serialize};

use super::{BreakthroughCandidate, Discipline};
use crate::metrics::compliance::ComplianceScore;
use crate::metrics::swim::SwimInterval;
use crate::metrics::terrain::{CadenceStats, ElevationStats, Split};
use crate::zones::{HrZone, PaceZone, PowerZone, ZoneDistribution};

/// Which input drove the intensity factor and TSS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TssMethod {
  Pace,
  Power,
  SwimPace,
  HeartRate,
}

/// Structured metrics for one completed workout.
///
/// Every metric is optional: a recording with only heart rate still yields
/// HR zones, TRIMP and hrTSS while the power and pace fields stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutAnalytics {
  pub discipline: Discipline,
  pub duration_seconds: Option<f64>,
  pub distance_meters: Option<f64>,
  pub average_hr: Option<f64>,
  pub average_power: Option<f64>,

  pub hr_zones: Option<ZoneDistribution<HrZone>>,
  pub pace_zones: Option<ZoneDistribution<PaceZone>>,
  pub power_zones: Option<ZoneDistribution<PowerZone>>,

  pub tss: Option<f64>,
  pub intensity_factor: Option<f64>,
  pub tss_method: Option<TssMethod>,
  pub trimp: Option<f64>,

  pub normalized_power: Option<f64>,
  pub variability_index: Option<f64>,
  pub average_pace_sec_per_km: Option<f64>,
  pub normalized_graded_pace_sec_per_km: Option<f64>,
  pub efficiency_factor: Option<f64>,
  pub aerobic_decoupling_pct: Option<f64>,

  #[serde(default)]
  pub splits: Vec<Split>,
  pub cadence: Option<CadenceStats>,
  pub elevation: Option<ElevationStats>,

  #[serde(default)]
  pub swim_intervals: Vec<SwimInterval>,
  pub swim_pace_sec_per_100m: Option<f64>,
  pub estimated_css_sec_per_100m: Option<f64>,

  pub compliance: Option<ComplianceScore>,

  /// Threshold candidates detected from this workout, attached after
  /// breakthrough detection runs
  #[serde(default)]
  pub breakthrough_candidates: Vec<BreakthroughCandidate>,
}

impl WorkoutAnalytics {
  pub fn empty(discipline: Discipline) -> Self {
    Self {
      discipline,
      duration_seconds: None,
      distance_meters: None,
      average_hr: None,
      average_power: None,
      hr_zones: None,
      pace_zones: None,
      power_zones: None,
      tss: None,
      intensity_factor: None,
      tss_method: None,
      trimp: None,
      normalized_power: None,
      variability_index: None,
      average_pace_sec_per_km: None,
      normalized_graded_pace_sec_per_km: None,
      efficiency_factor: None,
      aerobic_decoupling_pct: None,
      splits: Vec::new(),
      cadence: None,
      elevation: None,
      swim_intervals: Vec::new(),
      swim_pace_sec_per_100m: None,
      estimated_css_sec_per_100m: None,
      compliance: None,
      breakthrough_candidates: Vec::new(),
    }
  }
}
