use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::EngineConfig;
use crate::store::StoreError;

pub type DbPool = SqlitePool;

/// Connect to the configured database and run embedded migrations
pub async fn initialize_db(config: &EngineConfig) -> Result<DbPool, StoreError> {
  info!(url = %config.database_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(config.max_connections)
    .connect(&config.database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
