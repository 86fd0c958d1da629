//! tracing subscriber setup

use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  /// Human-readable output for terminals
  #[default]
  Pretty,
  /// One JSON object per event
  Json,
}

impl std::str::FromStr for LogFormat {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "pretty" => Ok(Self::Pretty),
      "json" => Ok(Self::Json),
      _ => Err(format!("Unknown log format: {}", s)),
    }
  }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Logs go to stderr so command
/// output on stdout stays machine-readable. Calling this twice is a no-op.
pub fn init_tracing(default_filter: &str, format: LogFormat) {
  let env_filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(default_filter))
    .unwrap_or_else(|_| EnvFilter::new("info"));

  let registry = tracing_subscriber::registry().with(env_filter);

  let result = match format {
    LogFormat::Json => registry
      .with(fmt::layer().json().with_target(true).with_writer(io::stderr))
      .try_init(),
    LogFormat::Pretty => registry
      .with(fmt::layer().with_target(false).with_writer(io::stderr))
      .try_init(),
  };

  if result.is_err() {
    tracing::debug!("Tracing subscriber already installed");
  }
}
