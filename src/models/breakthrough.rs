use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Threshold a breakthrough can promote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
  Ftp,
  Lthr,
  RunThreshold,
  SwimCss,
}

impl ZoneKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Ftp => "ftp",
      Self::Lthr => "lthr",
      Self::RunThreshold => "run_threshold",
      Self::SwimCss => "swim_css",
    }
  }

  /// For pace-like zones a lower value is an improvement
  pub fn lower_is_better(&self) -> bool {
    matches!(self, Self::RunThreshold | Self::SwimCss)
  }
}

impl std::fmt::Display for ZoneKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for ZoneKind {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ftp" => Ok(Self::Ftp),
      "lthr" => Ok(Self::Lthr),
      "run_threshold" => Ok(Self::RunThreshold),
      "swim_css" => Ok(Self::SwimCss),
      _ => Err(format!("Unknown zone kind: {}", s)),
    }
  }
}

/// A single workout's estimate of a new threshold, kept for corroboration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakthroughCandidate {
  pub zone: ZoneKind,
  pub detected_value: f64,
  pub detected_at: DateTime<Utc>,
  pub workout_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
  Low,
  Medium,
  High,
}

impl Confidence {
  /// Confidence for a total number of corroborating detections
  /// (including the current one)
  pub fn from_count(count: u32) -> Self {
    match count {
      0 | 1 => Self::Low,
      2 => Self::Medium,
      _ => Self::High,
    }
  }

  pub fn commits(&self) -> bool {
    *self >= Self::Medium
  }
}

impl std::fmt::Display for Confidence {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Low => write!(f, "low"),
      Self::Medium => write!(f, "medium"),
      Self::High => write!(f, "high"),
    }
  }
}

/// Outcome of breakthrough detection for one zone, relayed to the athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakthrough {
  pub zone: ZoneKind,
  pub current_value: f64,
  pub detected_value: f64,
  /// Improvement in percent; positive for faster paces and higher power
  pub change_pct: f64,
  pub confidence: Confidence,
  pub corroboration_count: u32,
  pub message: String,
  pub auto_committed: bool,
}
