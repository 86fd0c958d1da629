use serde::{Deserialize, Serialize};

use crate::zones::{hr_zone_bands, pace_zone_bands, power_zone_bands, ZoneBand};

/// LTHR fallback as a share of max HR
const LTHR_FROM_MAX_HR: f64 = 0.93;

/// Easy pace = threshold pace / 0.82
pub const THRESHOLD_TO_EASY_PACE: f64 = 0.82;

const DEFAULT_RESTING_HR: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
  #[default]
  Male,
  Female,
}

impl std::fmt::Display for Sex {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Male => write!(f, "male"),
      Self::Female => write!(f, "female"),
    }
  }
}

impl std::str::FromStr for Sex {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "male" => Ok(Self::Male),
      "female" => Ok(Self::Female),
      _ => Err(format!("Unknown sex: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
  Beginner,
  #[default]
  Intermediate,
  Advanced,
}

impl ExperienceLevel {
  /// (max_hr, ftp, easy pace sec/km, swim CSS sec/100m)
  fn defaults(self) -> (f64, f64, f64, f64) {
    match self {
      Self::Beginner => (185.0, 150.0, 420.0, 130.0),
      Self::Intermediate => (185.0, 200.0, 360.0, 110.0),
      Self::Advanced => (185.0, 260.0, 300.0, 90.0),
    }
  }
}

impl std::fmt::Display for ExperienceLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Beginner => write!(f, "beginner"),
      Self::Intermediate => write!(f, "intermediate"),
      Self::Advanced => write!(f, "advanced"),
    }
  }
}

impl std::str::FromStr for ExperienceLevel {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "beginner" => Ok(Self::Beginner),
      "intermediate" => Ok(Self::Intermediate),
      "advanced" => Ok(Self::Advanced),
      _ => Err(format!("Unknown experience level: {}", s)),
    }
  }
}

/// Thresholds as stored on the athlete's profile. Any value may be unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteProfile {
  #[serde(default)]
  pub max_hr: Option<f64>,
  #[serde(default)]
  pub resting_hr: Option<f64>,
  #[serde(default)]
  pub lthr: Option<f64>,
  #[serde(default)]
  pub ftp: Option<f64>,
  #[serde(default)]
  pub easy_pace_sec_per_km: Option<f64>,
  #[serde(default)]
  pub threshold_pace_sec_per_km: Option<f64>,
  #[serde(default)]
  pub swim_css_sec_per_100m: Option<f64>,
  #[serde(default)]
  pub experience_level: ExperienceLevel,
  #[serde(default)]
  pub sex: Sex,
}

impl AthleteProfile {
  /// Profile holding every value of already-resolved zones
  pub fn from_zones(zones: &UserZones) -> Self {
    Self {
      max_hr: Some(zones.max_hr),
      resting_hr: Some(zones.resting_hr),
      lthr: Some(zones.lactate_threshold_hr),
      ftp: Some(zones.ftp_watts),
      easy_pace_sec_per_km: Some(zones.easy_pace_sec_per_km),
      threshold_pace_sec_per_km: Some(zones.threshold_pace_sec_per_km),
      swim_css_sec_per_100m: Some(zones.swim_css_sec_per_100m),
      experience_level: ExperienceLevel::default(),
      sex: zones.sex,
    }
  }
}

/// Fully-resolved zones the calculators run against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserZones {
  pub max_hr: f64,
  pub resting_hr: f64,
  pub lactate_threshold_hr: f64,
  pub ftp_watts: f64,
  pub easy_pace_sec_per_km: f64,
  pub threshold_pace_sec_per_km: f64,
  pub swim_css_sec_per_100m: f64,
  pub sex: Sex,
}

impl UserZones {
  /// Resolve zones from a profile, filling gaps from experience-level defaults
  pub fn derive(profile: &AthleteProfile) -> Self {
    let (default_max_hr, default_ftp, default_easy, default_css) =
      profile.experience_level.defaults();

    let max_hr = profile.max_hr.filter(|v| *v > 0.0).unwrap_or(default_max_hr);
    let lactate_threshold_hr = profile
      .lthr
      .filter(|v| *v > 0.0)
      .unwrap_or(max_hr * LTHR_FROM_MAX_HR);

    let easy = profile.easy_pace_sec_per_km.filter(|v| *v > 0.0);
    let threshold = profile.threshold_pace_sec_per_km.filter(|v| *v > 0.0);
    let (easy_pace_sec_per_km, threshold_pace_sec_per_km) = match (easy, threshold) {
      (Some(e), Some(t)) => (e, t),
      (Some(e), None) => (e, e * THRESHOLD_TO_EASY_PACE),
      (None, Some(t)) => (t / THRESHOLD_TO_EASY_PACE, t),
      (None, None) => (default_easy, default_easy * THRESHOLD_TO_EASY_PACE),
    };

    Self {
      max_hr,
      resting_hr: profile
        .resting_hr
        .filter(|v| *v > 0.0 && *v < max_hr)
        .unwrap_or(DEFAULT_RESTING_HR),
      lactate_threshold_hr,
      ftp_watts: profile.ftp.filter(|v| *v > 0.0).unwrap_or(default_ftp),
      easy_pace_sec_per_km,
      threshold_pace_sec_per_km,
      swim_css_sec_per_100m: profile
        .swim_css_sec_per_100m
        .filter(|v| *v > 0.0)
        .unwrap_or(default_css),
      sex: profile.sex,
    }
  }
}

/// A committed zone change, one variant per zone kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneUpdate {
  Ftp { watts: f64 },
  Lthr { bpm: f64 },
  RunThreshold { threshold_pace_sec_per_km: f64, easy_pace_sec_per_km: f64 },
  SwimCss { sec_per_100m: f64 },
}

impl ZoneUpdate {
  pub fn apply_to(&self, profile: &mut AthleteProfile) {
    match *self {
      ZoneUpdate::Ftp { watts } => profile.ftp = Some(watts),
      ZoneUpdate::Lthr { bpm } => profile.lthr = Some(bpm),
      ZoneUpdate::RunThreshold {
        threshold_pace_sec_per_km,
        easy_pace_sec_per_km,
      } => {
        profile.threshold_pace_sec_per_km = Some(threshold_pace_sec_per_km);
        profile.easy_pace_sec_per_km = Some(easy_pace_sec_per_km);
      }
      ZoneUpdate::SwimCss { sec_per_100m } => profile.swim_css_sec_per_100m = Some(sec_per_100m),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Plan Zone Configuration
/// ---------------------------------------------------------------------------

pub const PLAN_ZONE_CONFIG_VERSION: u32 = 1;

/// Zone tables attached to the athlete's active training plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanZoneConfig {
  pub version: u32,
  pub hr_zones: Vec<ZoneBand>,
  pub power_zones: Vec<ZoneBand>,
  /// sec/km bands
  pub pace_zones: Vec<ZoneBand>,
  pub lthr: f64,
  pub swim_css_sec_per_100m: f64,
}

impl PlanZoneConfig {
  pub fn from_zones(zones: &UserZones) -> Self {
    Self {
      version: PLAN_ZONE_CONFIG_VERSION,
      hr_zones: hr_zone_bands(zones.max_hr),
      power_zones: power_zone_bands(zones.ftp_watts),
      pace_zones: pace_zone_bands(zones.easy_pace_sec_per_km),
      lthr: zones.lactate_threshold_hr,
      swim_css_sec_per_100m: zones.swim_css_sec_per_100m,
    }
  }

  /// Recompute whichever table depends on the updated value
  pub fn apply(&mut self, update: &ZoneUpdate) {
    match *update {
      ZoneUpdate::Ftp { watts } => self.power_zones = power_zone_bands(watts),
      ZoneUpdate::Lthr { bpm } => self.lthr = bpm,
      ZoneUpdate::RunThreshold {
        easy_pace_sec_per_km,
        ..
      } => self.pace_zones = pace_zone_bands(easy_pace_sec_per_km),
      ZoneUpdate::SwimCss { sec_per_100m } => self.swim_css_sec_per_100m = sec_per_100m,
    }
  }
}
