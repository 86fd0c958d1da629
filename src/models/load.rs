use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One node of a user's daily training-load chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrainingLoadSnapshot {
  pub user_id: i64,
  pub date: NaiveDate,
  /// Cumulative TSS of every workout on this date
  pub daily_tss: f64,
  /// Acute training load (7-day time constant)
  pub atl: f64,
  /// Chronic training load (42-day time constant)
  pub ctl: f64,
  /// ctl - atl
  pub tsb: f64,
}
