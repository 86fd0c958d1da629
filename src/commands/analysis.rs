use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::{AppState, WorkoutInput};
use crate::analysis::analyze_workout;
use crate::models::{
  AthleteProfile, Breakthrough, TrainingLoadSnapshot, UserZones, WorkoutAnalytics,
};
use crate::store::{AnalyticsStore, ProfileStore, StoreError};

/// Everything produced by ingesting one workout
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
  pub analytics: WorkoutAnalytics,
  pub training_load: TrainingLoadSnapshot,
  pub breakthroughs: Vec<Breakthrough>,
}

/// ---------------------------------------------------------------------------
/// Analysis Commands
/// ---------------------------------------------------------------------------

/// Analyze a workout without touching the store. Zones come from the input
/// profile, or experience-level defaults when it has none.
pub fn analyze_input(input: &WorkoutInput) -> WorkoutAnalytics {
  let profile = input.profile.clone().unwrap_or_default();
  let zones = UserZones::derive(&profile);
  let stream = input.stream();

  analyze_workout(
    input.discipline,
    stream.as_ref(),
    &input.summary,
    &zones,
    input.prescribed,
  )
}

/// Analyze, persist, add to the load chain and check for breakthroughs.
///
/// The stored profile is authoritative. A profile in the input only seeds
/// users that have none yet. Each workout can be ingested once.
pub async fn ingest_workout(
  state: &AppState,
  user_id: i64,
  workout_id: i64,
  date: NaiveDate,
  input: &WorkoutInput,
) -> Result<IngestReport, String> {
  let profile = resolve_profile(state, user_id, input.profile.as_ref()).await?;
  let zones = UserZones::derive(&profile);
  let stream = input.stream();

  let analytics = analyze_workout(
    input.discipline,
    stream.as_ref(),
    &input.summary,
    &zones,
    input.prescribed,
  );

  // The insert is the only gate: a concurrent ingest of the same workout
  // loses here before touching the load chain
  state
    .store
    .save_analytics(user_id, workout_id, &analytics)
    .await
    .map_err(|e| match e {
      StoreError::AlreadyExists(_) => format!("Workout {} has already been ingested", workout_id),
      e => format!("Failed to save analytics: {}", e),
    })?;

  let breakthroughs = state
    .detector
    .detect_zone_breakthroughs(
      user_id,
      workout_id,
      date,
      input.discipline,
      stream.as_ref(),
      &input.summary,
      &zones,
    )
    .await;

  let training_load = state
    .tracker
    .update_training_load(user_id, date, analytics.tss.unwrap_or(0.0))
    .await
    .map_err(|e| format!("Failed to update training load: {}", e))?;

  // Reload so the stored breakthrough candidates are attached
  let analytics = get_workout_analysis(state, workout_id).await?;

  info!(
    user_id,
    workout_id,
    discipline = %input.discipline,
    tss = ?analytics.tss,
    breakthroughs = breakthroughs.len(),
    "Workout ingested"
  );

  Ok(IngestReport {
    analytics,
    training_load,
    breakthroughs,
  })
}

pub async fn get_workout_analysis(
  state: &AppState,
  workout_id: i64,
) -> Result<WorkoutAnalytics, String> {
  state
    .store
    .get_analytics(workout_id)
    .await
    .map_err(|e| format!("Failed to get analysis: {}", e))
}

async fn resolve_profile(
  state: &AppState,
  user_id: i64,
  seed: Option<&AthleteProfile>,
) -> Result<AthleteProfile, String> {
  let stored = state
    .store
    .get_profile(user_id)
    .await
    .map_err(|e| format!("Failed to get profile: {}", e))?;

  match (stored, seed) {
    (Some(profile), _) => Ok(profile),
    (None, Some(seed)) => {
      state
        .store
        .save_profile(user_id, seed)
        .await
        .map_err(|e| format!("Failed to save profile: {}", e))?;
      Ok(seed.clone())
    }
    (None, None) => Ok(AthleteProfile::default()),
  }
}
