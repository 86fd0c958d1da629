//! Persistence seams
//!
//! The tracker and detector only see these traits; `SqliteStore` is the
//! sqlx-backed implementation used by the CLI and the tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::models::{
  AthleteProfile, BreakthroughCandidate, PlanZoneConfig, TrainingLoadSnapshot, WorkoutAnalytics,
  ZoneKind, PLAN_ZONE_CONFIG_VERSION,
};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration failed: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Failed to (de)serialize stored record: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Unsupported plan zone config version: {0}")]
  UnsupportedConfigVersion(u32),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Already exists: {0}")]
  AlreadyExists(String),
}

impl Serialize for StoreError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Repository Traits
/// ---------------------------------------------------------------------------

/// Daily training-load chain, one row per user per date
#[async_trait]
pub trait LoadStore: Send + Sync {
  async fn get_snapshot(
    &self,
    user_id: i64,
    date: NaiveDate,
  ) -> Result<Option<TrainingLoadSnapshot>, StoreError>;

  /// Most recent snapshot strictly before `date`
  async fn latest_snapshot_before(
    &self,
    user_id: i64,
    date: NaiveDate,
  ) -> Result<Option<TrainingLoadSnapshot>, StoreError>;

  /// Snapshots in `[from, to]`, oldest first
  async fn snapshots_between(
    &self,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError>;

  /// Snapshots strictly after `date`, oldest first
  async fn snapshots_after(
    &self,
    user_id: i64,
    date: NaiveDate,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError>;

  /// The latest `limit` snapshots, oldest first
  async fn recent_snapshots(
    &self,
    user_id: i64,
    limit: u32,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError>;

  async fn upsert_snapshot(&self, snapshot: &TrainingLoadSnapshot) -> Result<(), StoreError>;
}

/// Athlete thresholds and the active plan's zone tables
#[async_trait]
pub trait ProfileStore: Send + Sync {
  async fn get_profile(&self, user_id: i64) -> Result<Option<AthleteProfile>, StoreError>;

  async fn save_profile(&self, user_id: i64, profile: &AthleteProfile) -> Result<(), StoreError>;

  async fn get_plan_zone_config(&self, user_id: i64) -> Result<Option<PlanZoneConfig>, StoreError>;

  async fn save_plan_zone_config(
    &self,
    user_id: i64,
    config: &PlanZoneConfig,
  ) -> Result<(), StoreError>;
}

/// Corroboration history for threshold breakthroughs
#[async_trait]
pub trait BreakthroughStore: Send + Sync {
  /// Candidates of `zone` detected in `[since, until)`, not counting
  /// `exclude_workout`
  async fn count_candidates(
    &self,
    user_id: i64,
    zone: ZoneKind,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    exclude_workout: i64,
  ) -> Result<u32, StoreError>;

  /// Store a candidate; re-recording the same workout and zone replaces it
  async fn record_candidate(
    &self,
    user_id: i64,
    candidate: &BreakthroughCandidate,
  ) -> Result<(), StoreError>;

  async fn candidates_for_workout(
    &self,
    workout_id: i64,
  ) -> Result<Vec<BreakthroughCandidate>, StoreError>;
}

#[async_trait]
pub trait AnalyticsStore: Send + Sync {
  /// Insert analytics for a workout seen for the first time. A workout that
  /// is already stored fails with `AlreadyExists` and is left untouched.
  async fn save_analytics(
    &self,
    user_id: i64,
    workout_id: i64,
    analytics: &WorkoutAnalytics,
  ) -> Result<(), StoreError>;

  /// Stored analytics with their breakthrough candidates attached
  async fn get_analytics(&self, workout_id: i64) -> Result<WorkoutAnalytics, StoreError>;
}

/// ---------------------------------------------------------------------------
/// SQLite Implementation
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }
}

/// Fixed-width UTC timestamps so TEXT comparison orders chronologically
fn timestamp(dt: &DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored enum column, falling back to its default when corrupt
fn parse_or_default<T>(user_id: i64, column: &str, value: &str) -> T
where
  T: std::str::FromStr + Default,
{
  value.parse().unwrap_or_else(|_| {
    warn!(user_id, column, value, "Unrecognized profile value, using default");
    T::default()
  })
}

const SNAPSHOT_COLUMNS: &str = "user_id, date, daily_tss, atl, ctl, tsb";

#[async_trait]
impl LoadStore for SqliteStore {
  async fn get_snapshot(
    &self,
    user_id: i64,
    date: NaiveDate,
  ) -> Result<Option<TrainingLoadSnapshot>, StoreError> {
    let snapshot = sqlx::query_as::<_, TrainingLoadSnapshot>(&format!(
      "SELECT {SNAPSHOT_COLUMNS} FROM training_load WHERE user_id = ?1 AND date = ?2"
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(&self.pool)
    .await?;

    Ok(snapshot)
  }

  async fn latest_snapshot_before(
    &self,
    user_id: i64,
    date: NaiveDate,
  ) -> Result<Option<TrainingLoadSnapshot>, StoreError> {
    let snapshot = sqlx::query_as::<_, TrainingLoadSnapshot>(&format!(
      r#"
      SELECT {SNAPSHOT_COLUMNS} FROM training_load
      WHERE user_id = ?1 AND date < ?2
      ORDER BY date DESC
      LIMIT 1
      "#
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(&self.pool)
    .await?;

    Ok(snapshot)
  }

  async fn snapshots_between(
    &self,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError> {
    let snapshots = sqlx::query_as::<_, TrainingLoadSnapshot>(&format!(
      r#"
      SELECT {SNAPSHOT_COLUMNS} FROM training_load
      WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
      ORDER BY date ASC
      "#
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(&self.pool)
    .await?;

    Ok(snapshots)
  }

  async fn snapshots_after(
    &self,
    user_id: i64,
    date: NaiveDate,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError> {
    let snapshots = sqlx::query_as::<_, TrainingLoadSnapshot>(&format!(
      r#"
      SELECT {SNAPSHOT_COLUMNS} FROM training_load
      WHERE user_id = ?1 AND date > ?2
      ORDER BY date ASC
      "#
    ))
    .bind(user_id)
    .bind(date)
    .fetch_all(&self.pool)
    .await?;

    Ok(snapshots)
  }

  async fn recent_snapshots(
    &self,
    user_id: i64,
    limit: u32,
  ) -> Result<Vec<TrainingLoadSnapshot>, StoreError> {
    let mut snapshots = sqlx::query_as::<_, TrainingLoadSnapshot>(&format!(
      r#"
      SELECT {SNAPSHOT_COLUMNS} FROM training_load
      WHERE user_id = ?1
      ORDER BY date DESC
      LIMIT ?2
      "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;

    snapshots.reverse();
    Ok(snapshots)
  }

  async fn upsert_snapshot(&self, snapshot: &TrainingLoadSnapshot) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO training_load (user_id, date, daily_tss, atl, ctl, tsb, updated_at)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
      ON CONFLICT(user_id, date) DO UPDATE SET
        daily_tss = excluded.daily_tss,
        atl = excluded.atl,
        ctl = excluded.ctl,
        tsb = excluded.tsb,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(snapshot.user_id)
    .bind(snapshot.date)
    .bind(snapshot.daily_tss)
    .bind(snapshot.atl)
    .bind(snapshot.ctl)
    .bind(snapshot.tsb)
    .bind(timestamp(&Utc::now()))
    .execute(&self.pool)
    .await?;

    Ok(())
  }
}

#[async_trait]
impl ProfileStore for SqliteStore {
  async fn get_profile(&self, user_id: i64) -> Result<Option<AthleteProfile>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT max_hr, resting_hr, lthr, ftp, easy_pace_sec_per_km,
             threshold_pace_sec_per_km, swim_css_sec_per_100m,
             experience_level, sex
      FROM athlete_profiles
      WHERE user_id = ?1
      "#,
    )
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;

    let Some(row) = row else {
      return Ok(None);
    };

    let experience_level: String = row.get("experience_level");
    let sex: String = row.get("sex");

    Ok(Some(AthleteProfile {
      max_hr: row.get("max_hr"),
      resting_hr: row.get("resting_hr"),
      lthr: row.get("lthr"),
      ftp: row.get("ftp"),
      easy_pace_sec_per_km: row.get("easy_pace_sec_per_km"),
      threshold_pace_sec_per_km: row.get("threshold_pace_sec_per_km"),
      swim_css_sec_per_100m: row.get("swim_css_sec_per_100m"),
      experience_level: parse_or_default(user_id, "experience_level", &experience_level),
      sex: parse_or_default(user_id, "sex", &sex),
    }))
  }

  async fn save_profile(&self, user_id: i64, profile: &AthleteProfile) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO athlete_profiles (
        user_id, max_hr, resting_hr, lthr, ftp, easy_pace_sec_per_km,
        threshold_pace_sec_per_km, swim_css_sec_per_100m,
        experience_level, sex, updated_at
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
      ON CONFLICT(user_id) DO UPDATE SET
        max_hr = excluded.max_hr,
        resting_hr = excluded.resting_hr,
        lthr = excluded.lthr,
        ftp = excluded.ftp,
        easy_pace_sec_per_km = excluded.easy_pace_sec_per_km,
        threshold_pace_sec_per_km = excluded.threshold_pace_sec_per_km,
        swim_css_sec_per_100m = excluded.swim_css_sec_per_100m,
        experience_level = excluded.experience_level,
        sex = excluded.sex,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(user_id)
    .bind(profile.max_hr)
    .bind(profile.resting_hr)
    .bind(profile.lthr)
    .bind(profile.ftp)
    .bind(profile.easy_pace_sec_per_km)
    .bind(profile.threshold_pace_sec_per_km)
    .bind(profile.swim_css_sec_per_100m)
    .bind(profile.experience_level.to_string())
    .bind(profile.sex.to_string())
    .bind(timestamp(&Utc::now()))
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn get_plan_zone_config(&self, user_id: i64) -> Result<Option<PlanZoneConfig>, StoreError> {
    let row = sqlx::query("SELECT version, config_json FROM plan_zone_configs WHERE user_id = ?1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await?;

    let Some(row) = row else {
      return Ok(None);
    };

    let version: i64 = row.get("version");
    let version = u32::try_from(version).unwrap_or(0);
    if version != PLAN_ZONE_CONFIG_VERSION {
      return Err(StoreError::UnsupportedConfigVersion(version));
    }

    let config_json: String = row.get("config_json");
    let config: PlanZoneConfig = serde_json::from_str(&config_json)?;
    if config.version != PLAN_ZONE_CONFIG_VERSION {
      return Err(StoreError::UnsupportedConfigVersion(config.version));
    }

    Ok(Some(config))
  }

  async fn save_plan_zone_config(
    &self,
    user_id: i64,
    config: &PlanZoneConfig,
  ) -> Result<(), StoreError> {
    if config.version != PLAN_ZONE_CONFIG_VERSION {
      return Err(StoreError::UnsupportedConfigVersion(config.version));
    }

    let config_json = serde_json::to_string(config)?;
    sqlx::query(
      r#"
      INSERT INTO plan_zone_configs (user_id, version, config_json, updated_at)
      VALUES (?1, ?2, ?3, ?4)
      ON CONFLICT(user_id) DO UPDATE SET
        version = excluded.version,
        config_json = excluded.config_json,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(user_id)
    .bind(config.version)
    .bind(&config_json)
    .bind(timestamp(&Utc::now()))
    .execute(&self.pool)
    .await?;

    Ok(())
  }
}

#[async_trait]
impl BreakthroughStore for SqliteStore {
  async fn count_candidates(
    &self,
    user_id: i64,
    zone: ZoneKind,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    exclude_workout: i64,
  ) -> Result<u32, StoreError> {
    let count: i64 = sqlx::query_scalar(
      r#"
      SELECT COUNT(*) FROM breakthrough_candidates
      WHERE user_id = ?1
        AND zone = ?2
        AND detected_at >= ?3
        AND detected_at < ?4
        AND workout_id != ?5
      "#,
    )
    .bind(user_id)
    .bind(zone.as_str())
    .bind(timestamp(&since))
    .bind(timestamp(&until))
    .bind(exclude_workout)
    .fetch_one(&self.pool)
    .await?;

    Ok(u32::try_from(count).unwrap_or(u32::MAX))
  }

  async fn record_candidate(
    &self,
    user_id: i64,
    candidate: &BreakthroughCandidate,
  ) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO breakthrough_candidates (user_id, workout_id, zone, detected_value, detected_at)
      VALUES (?1, ?2, ?3, ?4, ?5)
      ON CONFLICT(workout_id, zone) DO UPDATE SET
        user_id = excluded.user_id,
        detected_value = excluded.detected_value,
        detected_at = excluded.detected_at
      "#,
    )
    .bind(user_id)
    .bind(candidate.workout_id)
    .bind(candidate.zone.as_str())
    .bind(candidate.detected_value)
    .bind(timestamp(&candidate.detected_at))
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn candidates_for_workout(
    &self,
    workout_id: i64,
  ) -> Result<Vec<BreakthroughCandidate>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT workout_id, zone, detected_value, detected_at
      FROM breakthrough_candidates
      WHERE workout_id = ?1
      ORDER BY id
      "#,
    )
    .bind(workout_id)
    .fetch_all(&self.pool)
    .await?;

    let mut candidates = Vec::with_capacity(rows.len());
    for row in rows {
      let zone: String = row.get("zone");
      let detected_at: String = row.get("detected_at");

      let (Ok(zone), Ok(detected_at)) = (
        zone.parse::<ZoneKind>(),
        DateTime::parse_from_rfc3339(&detected_at),
      ) else {
        warn!(workout_id, zone = %zone, "Skipping malformed breakthrough candidate row");
        continue;
      };

      candidates.push(BreakthroughCandidate {
        zone,
        detected_value: row.get("detected_value"),
        detected_at: detected_at.with_timezone(&Utc),
        workout_id: row.get("workout_id"),
      });
    }

    Ok(candidates)
  }
}

#[async_trait]
impl AnalyticsStore for SqliteStore {
  async fn save_analytics(
    &self,
    user_id: i64,
    workout_id: i64,
    analytics: &WorkoutAnalytics,
  ) -> Result<(), StoreError> {
    let analytics_json = serde_json::to_string(analytics)?;

    let result = sqlx::query(
      r#"
      INSERT INTO workout_analytics (workout_id, user_id, discipline, tss, analytics_json)
      VALUES (?1, ?2, ?3, ?4, ?5)
      ON CONFLICT(workout_id) DO NOTHING
      "#,
    )
    .bind(workout_id)
    .bind(user_id)
    .bind(analytics.discipline.to_string())
    .bind(analytics.tss)
    .bind(&analytics_json)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::AlreadyExists(format!("analytics for workout {}", workout_id)));
    }
    Ok(())
  }

  async fn get_analytics(&self, workout_id: i64) -> Result<WorkoutAnalytics, StoreError> {
    let analytics_json: Option<String> =
      sqlx::query_scalar("SELECT analytics_json FROM workout_analytics WHERE workout_id = ?1")
        .bind(workout_id)
        .fetch_optional(&self.pool)
        .await?;

    let analytics_json =
      analytics_json.ok_or_else(|| StoreError::NotFound(format!("analytics for workout {}", workout_id)))?;

    let mut analytics: WorkoutAnalytics = serde_json::from_str(&analytics_json)?;
    analytics.breakthrough_candidates = self.candidates_for_workout(workout_id).await?;
    Ok(analytics)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{Discipline, ExperienceLevel, Sex, UserZones, ZoneUpdate};
  use crate::test_utils::{candidate_at, date, setup_test_db, teardown_test_db};

  #[tokio::test]
  async fn test_snapshot_upsert_and_queries() {
    // Arrange
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    for (day, tss) in [(1, 50.0), (2, 60.0), (4, 70.0)] {
      let snapshot = TrainingLoadSnapshot {
        user_id: 1,
        date: date(2025, 3, day),
        daily_tss: tss,
        atl: tss / 2.0,
        ctl: tss / 4.0,
        tsb: tss / 4.0 - tss / 2.0,
      };
      store.upsert_snapshot(&snapshot).await.expect("Should upsert");
    }

    // Act
    let before = store
      .latest_snapshot_before(1, date(2025, 3, 4))
      .await
      .expect("Should query");
    let between = store
      .snapshots_between(1, date(2025, 3, 2), date(2025, 3, 31))
      .await
      .expect("Should query");
    let recent = store.recent_snapshots(1, 2).await.expect("Should query");
    let after = store
      .snapshots_after(1, date(2025, 3, 1))
      .await
      .expect("Should query");

    // Assert
    assert_eq!(before.unwrap().date, date(2025, 3, 2));
    assert_eq!(between.len(), 2);
    assert_eq!(after.len(), 2);
    assert_eq!(after[0].date, date(2025, 3, 2));
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].date, date(2025, 3, 2));
    assert_eq!(recent[1].date, date(2025, 3, 4));
    assert!(store.get_snapshot(2, date(2025, 3, 1)).await.unwrap().is_none());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_profile_round_trip() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let mut profile = AthleteProfile {
      ftp: Some(240.0),
      max_hr: Some(188.0),
      ..Default::default()
    };

    assert!(store.get_profile(7).await.unwrap().is_none());
    store.save_profile(7, &profile).await.expect("Should save");

    ZoneUpdate::Ftp { watts: 255.0 }.apply_to(&mut profile);
    store.save_profile(7, &profile).await.expect("Should update");

    let loaded = store.get_profile(7).await.unwrap().unwrap();
    assert_eq!(loaded.ftp, Some(255.0));
    assert_eq!(loaded.max_hr, Some(188.0));
    assert_eq!(loaded.lthr, None);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_corrupt_profile_enums_load_as_defaults() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    sqlx::query(
      "INSERT INTO athlete_profiles (user_id, ftp, experience_level, sex) VALUES (3, 230.0, 'elite', '?')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let loaded = store.get_profile(3).await.unwrap().unwrap();
    assert_eq!(loaded.ftp, Some(230.0));
    assert_eq!(loaded.experience_level, ExperienceLevel::Intermediate);
    assert_eq!(loaded.sex, Sex::Male);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_plan_zone_config_versioning() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let config = PlanZoneConfig::from_zones(&UserZones::derive(&AthleteProfile::default()));

    store.save_plan_zone_config(3, &config).await.expect("Should save");
    let loaded = store.get_plan_zone_config(3).await.unwrap().unwrap();
    assert_eq!(loaded, config);

    // A row written by a future schema must not be misread
    sqlx::query("UPDATE plan_zone_configs SET version = 99 WHERE user_id = 3")
      .execute(&pool)
      .await
      .unwrap();
    let result = store.get_plan_zone_config(3).await;
    assert!(matches!(result, Err(StoreError::UnsupportedConfigVersion(99))));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_candidate_counting_window() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());

    for (workout_id, day) in [(10, 1), (11, 10), (12, 20)] {
      store
        .record_candidate(1, &candidate_at(ZoneKind::Ftp, 280.0, workout_id, date(2025, 4, day)))
        .await
        .expect("Should record");
    }
    store
      .record_candidate(1, &candidate_at(ZoneKind::SwimCss, 95.0, 13, date(2025, 4, 15)))
      .await
      .unwrap();

    let since = candidate_at(ZoneKind::Ftp, 0.0, 0, date(2025, 4, 5)).detected_at;
    let until = candidate_at(ZoneKind::Ftp, 0.0, 0, date(2025, 4, 20)).detected_at;

    let count = store
      .count_candidates(1, ZoneKind::Ftp, since, until, 0)
      .await
      .unwrap();
    assert_eq!(count, 1);

    let excluding = store
      .count_candidates(1, ZoneKind::Ftp, since, until, 11)
      .await
      .unwrap();
    assert_eq!(excluding, 0);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_rerecording_candidate_replaces_it() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());

    store
      .record_candidate(1, &candidate_at(ZoneKind::Ftp, 270.0, 42, date(2025, 5, 1)))
      .await
      .unwrap();
    store
      .record_candidate(1, &candidate_at(ZoneKind::Ftp, 275.0, 42, date(2025, 5, 1)))
      .await
      .unwrap();

    let candidates = store.candidates_for_workout(42).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].detected_value, 275.0);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_analytics_attach_candidates() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let mut analytics = WorkoutAnalytics::empty(Discipline::Bike);
    analytics.tss = Some(88.0);

    store.save_analytics(1, 5, &analytics).await.expect("Should save");
    store
      .record_candidate(1, &candidate_at(ZoneKind::Ftp, 280.0, 5, date(2025, 6, 1)))
      .await
      .unwrap();

    let loaded = store.get_analytics(5).await.expect("Should load");
    assert_eq!(loaded.tss, Some(88.0));
    assert_eq!(loaded.breakthrough_candidates.len(), 1);
    assert_eq!(loaded.breakthrough_candidates[0].zone, ZoneKind::Ftp);

    let missing = store.get_analytics(6).await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));

    analytics.tss = Some(10.0);
    let again = store.save_analytics(1, 5, &analytics).await;
    assert!(matches!(again, Err(StoreError::AlreadyExists(_))));
    assert_eq!(store.get_analytics(5).await.unwrap().tss, Some(88.0));

    teardown_test_db(pool).await;
  }
}
