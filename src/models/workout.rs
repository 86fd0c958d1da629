use serde::{Deserialize, Serialize};

/// Sport of a completed workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
  Run,
  Bike,
  Swim,
  /// Bike-to-run transition session
  Brick,
}

impl std::fmt::Display for Discipline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Run => write!(f, "run"),
      Self::Bike => write!(f, "bike"),
      Self::Swim => write!(f, "swim"),
      Self::Brick => write!(f, "brick"),
    }
  }
}

impl std::str::FromStr for Discipline {
  type Err = String;

  /// Accepts our own names as well as common provider activity types
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "run" | "trailrun" | "virtualrun" | "running" => Ok(Self::Run),
      "bike" | "ride" | "virtualride" | "cycling" | "ebikeride" => Ok(Self::Bike),
      "swim" | "swimming" => Ok(Self::Swim),
      "brick" => Ok(Self::Brick),
      _ => Err(format!("Unknown discipline: {}", s)),
    }
  }
}

/// Aggregate activity fields, used when no stream is available.
/// Field aliases accept Strava's activity payload names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitySummary {
  #[serde(default, alias = "distance")]
  pub distance_meters: Option<f64>,
  #[serde(default, alias = "moving_time")]
  pub moving_time_seconds: Option<i64>,
  #[serde(default, alias = "elapsed_time")]
  pub elapsed_time_seconds: Option<i64>,
  #[serde(default, alias = "average_heartrate")]
  pub average_hr: Option<f64>,
  #[serde(default, alias = "max_heartrate")]
  pub max_hr: Option<f64>,
  #[serde(default, alias = "average_watts")]
  pub average_watts: Option<f64>,
  /// m/s
  #[serde(default)]
  pub average_speed: Option<f64>,
  #[serde(default)]
  pub average_cadence: Option<f64>,
  #[serde(default, alias = "total_elevation_gain")]
  pub elevation_gain_meters: Option<f64>,
}

impl ActivitySummary {
  /// Moving time, falling back to elapsed time
  pub fn duration_seconds(&self) -> Option<f64> {
    self
      .moving_time_seconds
      .or(self.elapsed_time_seconds)
      .filter(|s| *s > 0)
      .map(|s| s as f64)
  }

  /// Average pace in sec/km from distance and moving time
  pub fn pace_sec_per_km(&self) -> Option<f64> {
    match (self.duration_seconds(), self.distance_meters) {
      (Some(dur), Some(dist)) if dist > 0.0 => Some(dur / (dist / 1000.0)),
      _ => None,
    }
  }

  /// Average pace in sec/100m
  pub fn pace_sec_per_100m(&self) -> Option<f64> {
    self.pace_sec_per_km().map(|p| p / 10.0)
  }
}

/// Intensity label the plan prescribed for this workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrescribedIntensity {
  Easy,
  Moderate,
  Hard,
  Max,
}

impl std::str::FromStr for PrescribedIntensity {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "easy" => Ok(Self::Easy),
      "moderate" => Ok(Self::Moderate),
      "hard" => Ok(Self::Hard),
      "max" => Ok(Self::Max),
      _ => Err(format!("Unknown intensity: {}", s)),
    }
  }
}
