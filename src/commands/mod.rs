pub mod analysis;
pub mod load;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::breakthrough::ZoneBreakthroughDetector;
use crate::config::EngineConfig;
use crate::db::DbPool;
use crate::locks::UserLocks;
use crate::models::{ActivitySummary, AthleteProfile, Discipline, PrescribedIntensity};
use crate::store::SqliteStore;
use crate::streams::StreamRecord;
use crate::training_load::TrainingLoadTracker;

/// Shared handles for every command. The tracker and detector share one
/// lock table so a user's load and zone writes never interleave.
pub struct AppState {
  pub store: Arc<SqliteStore>,
  pub tracker: TrainingLoadTracker<SqliteStore>,
  pub detector: ZoneBreakthroughDetector<SqliteStore>,
}

impl AppState {
  pub fn new(pool: DbPool, config: &EngineConfig) -> Self {
    let store = Arc::new(SqliteStore::new(pool));
    let locks = UserLocks::new();

    Self {
      tracker: TrainingLoadTracker::new(store.clone(), locks.clone()),
      detector: ZoneBreakthroughDetector::new(
        store.clone(),
        locks,
        config.breakthrough.clone(),
      ),
      store,
    }
  }
}

/// A completed workout as handed to the CLI
#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutInput {
  pub discipline: Discipline,
  #[serde(default)]
  pub summary: ActivitySummary,
  /// Raw channel arrays keyed by channel name
  #[serde(default)]
  pub streams: Option<HashMap<String, Vec<f64>>>,
  /// Falls back to the stored profile on ingest
  #[serde(default)]
  pub profile: Option<AthleteProfile>,
  #[serde(default)]
  pub prescribed: Option<PrescribedIntensity>,
}

impl WorkoutInput {
  pub fn from_json(json: &str) -> Result<Self, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid workout file: {}", e))
  }

  /// Normalized stream, or `None` for a summary-only workout. Streams
  /// without a usable time channel are dropped and the summary is used.
  pub fn stream(&self) -> Option<StreamRecord> {
    let raw = self.streams.as_ref().filter(|raw| !raw.is_empty())?;
    match StreamRecord::normalize(raw) {
      Ok(stream) => Some(stream),
      Err(e) => {
        warn!(error = %e, "Ignoring unusable streams");
        None
      }
    }
  }
}
