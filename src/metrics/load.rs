//! Intensity factor and training stress score per discipline.
//!
//! Every variant scales with IF², so doubling intensity at a fixed duration
//! quadruples the load. rTSS is further divided by threshold pace (sec/km).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressScore {
  pub intensity_factor: f64,
  pub tss: f64,
}

impl StressScore {
  fn from_intensity(duration_seconds: f64, intensity_factor: f64) -> Option<Self> {
    Self::scaled(duration_seconds, intensity_factor, 1.0)
  }

  /// duration x IF² / (divisor x 3600) x 100
  fn scaled(duration_seconds: f64, intensity_factor: f64, divisor: f64) -> Option<Self> {
    if duration_seconds <= 0.0 || !intensity_factor.is_finite() || intensity_factor <= 0.0 {
      return None;
    }
    Some(Self {
      intensity_factor,
      tss: duration_seconds * intensity_factor.powi(2) / (divisor * 3600.0) * 100.0,
    })
  }
}

/// rTSS = duration x IF² / (threshold pace x 3600) x 100, paces in sec/km
pub fn running_stress(duration_seconds: f64, graded_pace: f64, threshold_pace: f64) -> Option<StressScore> {
  if graded_pace <= 0.0 || threshold_pace <= 0.0 {
    return None;
  }
  StressScore::scaled(duration_seconds, threshold_pace / graded_pace, threshold_pace)
}

/// TSS = duration x NP x IF / (FTP x 3600) x 100
pub fn cycling_stress(duration_seconds: f64, normalized_power: f64, ftp: f64) -> Option<StressScore> {
  if normalized_power <= 0.0 || ftp <= 0.0 || duration_seconds <= 0.0 {
    return None;
  }
  let intensity_factor = normalized_power / ftp;
  Some(StressScore {
    intensity_factor,
    tss: duration_seconds * normalized_power * intensity_factor / (ftp * 3600.0) * 100.0,
  })
}

/// sTSS from average pace per 100 m against CSS
pub fn swim_stress(duration_seconds: f64, pace_sec_per_100m: f64, css_sec_per_100m: f64) -> Option<StressScore> {
  if pace_sec_per_100m <= 0.0 || css_sec_per_100m <= 0.0 {
    return None;
  }
  StressScore::from_intensity(duration_seconds, css_sec_per_100m / pace_sec_per_100m)
}

/// hrTSS, used when neither pace nor power gives an intensity
pub fn heart_rate_stress(duration_seconds: f64, average_hr: f64, lthr: f64) -> Option<StressScore> {
  if average_hr <= 0.0 || lthr <= 0.0 {
    return None;
  }
  StressScore::from_intensity(duration_seconds, average_hr / lthr)
}
