//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Synthetic activity streams
//! - Zone and candidate fixtures

use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;

use crate::models::{BreakthroughCandidate, Sex, UserZones, ZoneKind};
use crate::streams::StreamRecord;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Fixtures
/// ---------------------------------------------------------------------------

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Candidate detected at midnight UTC on `on`
pub fn candidate_at(
  zone: ZoneKind,
  detected_value: f64,
  workout_id: i64,
  on: NaiveDate,
) -> BreakthroughCandidate {
  BreakthroughCandidate {
    zone,
    detected_value,
    detected_at: on.and_time(NaiveTime::MIN).and_utc(),
    workout_id,
  }
}

/// A trained intermediate athlete
pub fn mock_user_zones() -> UserZones {
  UserZones {
    max_hr: 190.0,
    resting_hr: 60.0,
    lactate_threshold_hr: 170.0,
    ftp_watts: 250.0,
    easy_pace_sec_per_km: 360.0,
    threshold_pace_sec_per_km: 295.2,
    swim_css_sec_per_100m: 110.0,
    sex: Sex::Male,
  }
}

/// ---------------------------------------------------------------------------
/// Synthetic Streams
/// ---------------------------------------------------------------------------

/// Steady 1 Hz run: `seconds` samples at constant speed and heart rate.
/// Altitude is flat at the given height, or absent.
pub fn run_stream(seconds: usize, speed: f64, hr: f64, altitude: Option<f64>) -> StreamRecord {
  StreamRecord {
    time: (0..seconds).map(|i| i as f64).collect(),
    distance: (0..seconds).map(|i| i as f64 * speed).collect(),
    heartrate: vec![hr; seconds],
    velocity: vec![speed; seconds],
    altitude: altitude.map(|a| vec![a; seconds]).unwrap_or_default(),
    power: Vec::new(),
    cadence: vec![170.0; seconds],
  }
}

/// Steady 1 Hz ride at 8 m/s
pub fn ride_stream(seconds: usize, watts: f64, hr: f64) -> StreamRecord {
  StreamRecord {
    time: (0..seconds).map(|i| i as f64).collect(),
    distance: (0..seconds).map(|i| i as f64 * 8.0).collect(),
    heartrate: vec![hr; seconds],
    velocity: vec![8.0; seconds],
    altitude: Vec::new(),
    power: vec![watts; seconds],
    cadence: vec![90.0; seconds],
  }
}

/// Pool swim built from `(meters, seconds, rest_seconds)` repeats.
///
/// Each repeat is swum at even pace. Rest samples sit still on the wall, and
/// the next repeat starts one second after the last rest sample.
pub fn swim_stream(repeats: &[(f64, usize, usize)]) -> StreamRecord {
  let mut stream = StreamRecord::default();
  let mut t = 0.0;
  let mut d = 0.0;

  for &(meters, seconds, rest) in repeats {
    let v = meters / seconds as f64;
    for k in 0..=seconds {
      stream.time.push(t + k as f64);
      stream.distance.push(d + v * k as f64);
      stream.velocity.push(v);
    }
    t += seconds as f64;
    d += meters;

    for _ in 0..rest {
      t += 1.0;
      stream.time.push(t);
      stream.distance.push(d);
      stream.velocity.push(0.0);
    }
    t += 1.0;
  }

  stream
}
