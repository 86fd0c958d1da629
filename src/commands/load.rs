use chrono::{Days, NaiveDate};

use super::AppState;
use crate::models::TrainingLoadSnapshot;
use crate::training_load::{analyze_fitness_trend, FitnessTrend};

/// Two weeks: the current week plus the one it is compared against
const TREND_WINDOW_DAYS: u64 = 14;

/// ---------------------------------------------------------------------------
/// Training Load Commands
/// ---------------------------------------------------------------------------

/// Fitness trend over the two weeks ending `as_of`, or ending on the user's
/// most recent training day. `None` when the user has no load history.
pub async fn get_fitness_trend(
  state: &AppState,
  user_id: i64,
  as_of: Option<NaiveDate>,
) -> Result<Option<FitnessTrend>, String> {
  let end = match as_of {
    Some(date) => date,
    None => {
      let latest = state
        .tracker
        .history(user_id, 1)
        .await
        .map_err(|e| format!("Failed to load training history: {}", e))?;
      match latest.last() {
        Some(snapshot) => snapshot.date,
        None => return Ok(None),
      }
    }
  };

  let start = end
    .checked_sub_days(Days::new(TREND_WINDOW_DAYS - 1))
    .unwrap_or(end);
  let chain = state
    .tracker
    .daily_chain(user_id, start, end)
    .await
    .map_err(|e| format!("Failed to build training load chain: {}", e))?;

  Ok(analyze_fitness_trend(&chain))
}

pub async fn replay_training_load(
  state: &AppState,
  user_id: i64,
  from: NaiveDate,
  to: NaiveDate,
) -> Result<Vec<TrainingLoadSnapshot>, String> {
  if from > to {
    return Err(format!("Replay range is empty: {} is after {}", from, to));
  }

  state
    .tracker
    .replay_training_load(user_id, from, to)
    .await
    .map_err(|e| format!("Failed to replay training load: {}", e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::EngineConfig;
  use crate::test_utils::{date, setup_test_db, teardown_test_db};
  use crate::training_load::TrendDirection;

  #[tokio::test]
  async fn test_trend_without_history() {
    let pool = setup_test_db().await;
    let state = AppState::new(pool.clone(), &EngineConfig::default());

    let trend = get_fitness_trend(&state, 1, None).await.unwrap();
    assert!(trend.is_none());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_trend_ends_on_latest_training_day() {
    // Arrange: a quiet week, then a hard one with rest days in between
    let pool = setup_test_db().await;
    let state = AppState::new(pool.clone(), &EngineConfig::default());
    for day in [1, 4] {
      state.tracker.update_training_load(1, date(2025, 5, day), 40.0).await.unwrap();
    }
    for day in [8, 9, 11, 12, 14] {
      state.tracker.update_training_load(1, date(2025, 5, day), 120.0).await.unwrap();
    }

    // Act
    let trend = get_fitness_trend(&state, 1, None).await.unwrap().unwrap();

    // Assert
    assert_eq!(trend.weekly_tss, 600.0);
    assert_eq!(trend.previous_weekly_tss, 80.0);
    assert_eq!(trend.weekly_volume_trend, TrendDirection::Increasing);
    assert_eq!(trend.atl_trend, TrendDirection::Increasing);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_replay_rejects_inverted_range() {
    let pool = setup_test_db().await;
    let state = AppState::new(pool.clone(), &EngineConfig::default());

    let result = replay_training_load(&state, 1, date(2025, 5, 10), date(2025, 5, 1)).await;
    assert!(result.is_err());

    teardown_test_db(pool).await;
  }
}
