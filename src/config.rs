//! Engine configuration loaded from the environment
//!
//! Call `dotenvy::dotenv()` first to pick up a local `.env` file.

use std::env;
use std::str::FromStr;

use crate::logging::LogFormat;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://workout-analytics.db?mode=rwc";
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_LOOKBACK_DAYS: i64 = 30;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value:?}")]
  Invalid { key: String, value: String },
}

/// Minimum improvements and corroboration window for threshold promotion
#[derive(Debug, Clone, PartialEq)]
pub struct BreakthroughPolicy {
  pub lookback_days: i64,
  /// Fractional gains, e.g. 0.03 = 3%
  pub ftp_min_gain: f64,
  pub lthr_min_gain: f64,
  pub run_pace_min_gain: f64,
  pub css_min_gain: f64,
}

impl Default for BreakthroughPolicy {
  fn default() -> Self {
    Self {
      lookback_days: DEFAULT_LOOKBACK_DAYS,
      ftp_min_gain: 0.03,
      lthr_min_gain: 0.03,
      run_pace_min_gain: 0.02,
      css_min_gain: 0.02,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
  pub database_url: String,
  pub max_connections: u32,
  pub log_filter: String,
  pub log_format: LogFormat,
  pub breakthrough: BreakthroughPolicy,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      max_connections: DEFAULT_MAX_CONNECTIONS,
      log_filter: DEFAULT_LOG_FILTER.to_string(),
      log_format: LogFormat::default(),
      breakthrough: BreakthroughPolicy::default(),
    }
  }
}

impl EngineConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let lookback_days: i64 = parse_var("BREAKTHROUGH_LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?;
    if lookback_days <= 0 {
      return Err(invalid("BREAKTHROUGH_LOOKBACK_DAYS", lookback_days));
    }

    let max_connections: u32 = parse_var("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
    if max_connections == 0 {
      return Err(invalid("DB_MAX_CONNECTIONS", max_connections));
    }

    Ok(Self {
      database_url: env::var("WORKOUT_ANALYTICS_DB_URL")
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
      max_connections,
      log_filter: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
      log_format: parse_var("LOG_FORMAT", LogFormat::default())?,
      breakthrough: BreakthroughPolicy {
        lookback_days,
        ..Default::default()
      },
    })
  }
}

/// Unset means `default`; set but unparseable is an error
fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
  match env::var(key) {
    Ok(value) => value.trim().parse().map_err(|_| invalid(key, value)),
    Err(_) => Ok(default),
  }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
  ConfigError::Invalid {
    key: key.to_string(),
    value: value.to_string(),
  }
}
