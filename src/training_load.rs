//! Training load tracking
//!
//! Maintains one exponentially weighted snapshot per user per calendar day:
//!
//! - ATL (acute load): 7-day time constant
//! - CTL (chronic load): 42-day time constant
//! - TSB (form): CTL - ATL
//!
//! Each day is derived from the previous day's ATL/CTL and the day's
//! cumulative TSS. A second workout on the same day recomputes that day from
//! the previous day's baseline with the summed TSS; it is never applied on top
//! of the first workout's result.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::locks::UserLocks;
use crate::models::TrainingLoadSnapshot;
use crate::store::{LoadStore, StoreError};

const ATL_TIME_CONSTANT_DAYS: f64 = 7.0;
const CTL_TIME_CONSTANT_DAYS: f64 = 42.0;

/// ---------------------------------------------------------------------------
/// Daily Recurrence
/// ---------------------------------------------------------------------------

/// Derive the snapshot for `date` from the most recent earlier snapshot.
///
/// Days between `previous` and `date` carry zero TSS, so the earlier values
/// decay across the gap. With no previous snapshot the chain starts at zero.
pub fn compute_snapshot(
  user_id: i64,
  date: NaiveDate,
  previous: Option<&TrainingLoadSnapshot>,
  daily_tss: f64,
) -> TrainingLoadSnapshot {
  let (atl_prev, ctl_prev) = match previous {
    Some(prev) if prev.date < date => {
      let empty_days = ((date - prev.date).num_days() - 1) as f64;
      (
        prev.atl * (-empty_days / ATL_TIME_CONSTANT_DAYS).exp(),
        prev.ctl * (-empty_days / CTL_TIME_CONSTANT_DAYS).exp(),
      )
    }
    _ => (0.0, 0.0),
  };

  let atl_decay = (-1.0 / ATL_TIME_CONSTANT_DAYS).exp();
  let ctl_decay = (-1.0 / CTL_TIME_CONSTANT_DAYS).exp();

  let atl = atl_prev * atl_decay + daily_tss * (1.0 - atl_decay);
  let ctl = ctl_prev * ctl_decay + daily_tss * (1.0 - ctl_decay);

  TrainingLoadSnapshot {
    user_id,
    date,
    daily_tss,
    atl,
    ctl,
    tsb: ctl - atl,
  }
}

/// ---------------------------------------------------------------------------
/// Tracker
/// ---------------------------------------------------------------------------

pub struct TrainingLoadTracker<S> {
  store: Arc<S>,
  locks: UserLocks,
}

impl<S: LoadStore> TrainingLoadTracker<S> {
  pub fn new(store: Arc<S>, locks: UserLocks) -> Self {
    Self { store, locks }
  }

  /// Add a workout's TSS to `date` and return the day's new snapshot.
  ///
  /// When later days are already stored (a workout synced late), they are
  /// recomputed in order so the chain stays consistent.
  pub async fn update_training_load(
    &self,
    user_id: i64,
    date: NaiveDate,
    tss: f64,
  ) -> Result<TrainingLoadSnapshot, StoreError> {
    let _guard = self.locks.lock(user_id).await;

    let existing_tss = self
      .store
      .get_snapshot(user_id, date)
      .await?
      .map_or(0.0, |s| s.daily_tss);
    let previous = self.store.latest_snapshot_before(user_id, date).await?;

    let snapshot = compute_snapshot(user_id, date, previous.as_ref(), existing_tss + tss.max(0.0));
    self.store.upsert_snapshot(&snapshot).await?;

    debug!(
      user_id,
      date = %date,
      daily_tss = snapshot.daily_tss,
      atl = snapshot.atl,
      ctl = snapshot.ctl,
      tsb = snapshot.tsb,
      "Training load updated"
    );

    let later = self.store.snapshots_after(user_id, date).await?;
    if !later.is_empty() {
      info!(user_id, date = %date, days = later.len(), "Recomputing later training load days");
      let mut prev = snapshot.clone();
      for stored in later {
        let next = compute_snapshot(user_id, stored.date, Some(&prev), stored.daily_tss);
        self.store.upsert_snapshot(&next).await?;
        prev = next;
      }
    }

    Ok(snapshot)
  }

  /// Rebuild every day in `[from, to]` in chronological order.
  ///
  /// Days without a stored snapshot are written as zero-TSS days. Returns the
  /// rebuilt chain, oldest first.
  pub async fn replay_training_load(
    &self,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError> {
    if from > to {
      return Ok(Vec::new());
    }

    let _guard = self.locks.lock(user_id).await;

    let chain = self.build_chain(user_id, from, to).await?;
    for snapshot in &chain {
      self.store.upsert_snapshot(snapshot).await?;
    }

    info!(user_id, from = %from, to = %to, days = chain.len(), "Training load replayed");

    Ok(chain)
  }

  /// One snapshot per day in `[from, to]`, read-only. Days with nothing
  /// stored appear as zero-TSS days decayed from the day before.
  pub async fn daily_chain(
    &self,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError> {
    if from > to {
      return Ok(Vec::new());
    }
    self.build_chain(user_id, from, to).await
  }

  async fn build_chain(
    &self,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError> {
    let mut previous = self.store.latest_snapshot_before(user_id, from).await?;
    let stored: HashMap<NaiveDate, f64> = self
      .store
      .snapshots_between(user_id, from, to)
      .await?
      .into_iter()
      .map(|s| (s.date, s.daily_tss))
      .collect();

    let mut chain = Vec::new();
    for date in from.iter_days().take_while(|d| *d <= to) {
      let daily_tss = stored.get(&date).copied().unwrap_or(0.0);
      let snapshot = compute_snapshot(user_id, date, previous.as_ref(), daily_tss);
      previous = Some(snapshot.clone());
      chain.push(snapshot);
    }

    Ok(chain)
  }

  /// Latest `days` snapshots, oldest first
  pub async fn history(
    &self,
    user_id: i64,
    days: u32,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError> {
    self.store.recent_snapshots(user_id, days).await
  }
}

/// ---------------------------------------------------------------------------
/// Fitness Trend
/// ---------------------------------------------------------------------------

const TREND_LOOKBACK_ENTRIES: usize = 7;
const CTL_TREND_THRESHOLD: f64 = 2.0;
const ATL_TREND_THRESHOLD: f64 = 3.0;
const VOLUME_TREND_THRESHOLD_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
  Increasing,
  Stable,
  Decreasing,
}

impl TrendDirection {
  fn from_change(change: f64, threshold: f64) -> Self {
    if change > threshold {
      Self::Increasing
    } else if change < -threshold {
      Self::Decreasing
    } else {
      Self::Stable
    }
  }
}

/// Freshness bucket derived from TSB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Form {
  Fresh,
  Neutral,
  Fatigued,
  VeryFatigued,
}

impl Form {
  pub fn from_tsb(tsb: f64) -> Self {
    match tsb {
      t if t > 15.0 => Form::Fresh,
      t if t > -10.0 => Form::Neutral,
      t if t > -30.0 => Form::Fatigued,
      _ => Form::VeryFatigued,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessTrend {
  pub ctl: f64,
  pub atl: f64,
  pub tsb: f64,
  pub ctl_change: f64,
  pub atl_change: f64,
  pub ctl_trend: TrendDirection,
  pub atl_trend: TrendDirection,
  pub form: Form,
  pub weekly_tss: f64,
  pub previous_weekly_tss: f64,
  pub weekly_volume_trend: TrendDirection,
}

/// Classify the direction of fitness, fatigue and volume.
///
/// `history` is a daily chain, oldest first. The latest entry is compared to
/// the one 7 entries earlier, or to the oldest entry when the history is
/// shorter. Weekly volume compares the TSS of the last 7 entries against the
/// 7 before them. `None` for an empty history.
pub fn analyze_fitness_trend(history: &[TrainingLoadSnapshot]) -> Option<FitnessTrend> {
  let latest = history.last()?;
  let baseline = &history[history.len().saturating_sub(TREND_LOOKBACK_ENTRIES + 1)];

  let ctl_change = latest.ctl - baseline.ctl;
  let atl_change = latest.atl - baseline.atl;

  let week_start = history.len().saturating_sub(TREND_LOOKBACK_ENTRIES);
  let prior_start = week_start.saturating_sub(TREND_LOOKBACK_ENTRIES);
  let weekly_tss: f64 = history[week_start..].iter().map(|s| s.daily_tss).sum();
  let previous_weekly_tss: f64 = history[prior_start..week_start]
    .iter()
    .map(|s| s.daily_tss)
    .sum();

  let weekly_volume_trend = if previous_weekly_tss > 0.0 {
    let change_pct = (weekly_tss - previous_weekly_tss) / previous_weekly_tss * 100.0;
    TrendDirection::from_change(change_pct, VOLUME_TREND_THRESHOLD_PCT)
  } else if weekly_tss > 0.0 {
    TrendDirection::Increasing
  } else {
    TrendDirection::Stable
  };

  Some(FitnessTrend {
    ctl: latest.ctl,
    atl: latest.atl,
    tsb: latest.tsb,
    ctl_change,
    atl_change,
    ctl_trend: TrendDirection::from_change(ctl_change, CTL_TREND_THRESHOLD),
    atl_trend: TrendDirection::from_change(atl_change, ATL_TREND_THRESHOLD),
    form: Form::from_tsb(latest.tsb),
    weekly_tss,
    previous_weekly_tss,
    weekly_volume_trend,
  })
}
