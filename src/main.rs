//! Workout analytics CLI.
//!
//! Usage:
//! ```bash
//! # Analyze a workout file without storing anything
//! workout-analytics analyze ride.json
//!
//! # Store a workout, update training load and check for breakthroughs
//! workout-analytics ingest ride.json --user 1 --workout 42 --date 2025-06-01
//!
//! # Fitness trend for the last two weeks of training
//! workout-analytics trend --user 1
//!
//! # Rebuild the load chain after editing history
//! workout-analytics replay --user 1 --from 2025-01-01 --to 2025-06-30
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use workout_analytics::commands::{analysis, load, AppState, WorkoutInput};
use workout_analytics::config::EngineConfig;
use workout_analytics::db;
use workout_analytics::logging::init_tracing;

#[derive(Parser)]
#[command(
  name = "workout-analytics",
  about = "Physiological analytics for endurance workouts",
  long_about = "Compute zones, training stress and load for runs, rides and swims, and detect threshold breakthroughs"
)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Analyze a workout JSON file and print the analytics
  Analyze {
    file: PathBuf,
  },
  /// Analyze and store a workout for a user
  Ingest {
    file: PathBuf,
    #[arg(long)]
    user: i64,
    #[arg(long)]
    workout: i64,
    /// Training day (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,
  },
  /// Print stored analytics for a workout
  Show {
    #[arg(long)]
    workout: i64,
  },
  /// Print the fitness trend
  Trend {
    #[arg(long)]
    user: i64,
    /// Last day of the trend window (defaults to the latest training day)
    #[arg(long)]
    as_of: Option<NaiveDate>,
  },
  /// Rebuild the daily load chain over a date range
  Replay {
    #[arg(long)]
    user: i64,
    #[arg(long)]
    from: NaiveDate,
    #[arg(long)]
    to: NaiveDate,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenvy::dotenv().ok();

  let config = EngineConfig::from_env().context("Invalid configuration")?;
  init_tracing(&config.log_filter, config.log_format);

  let cli = Cli::parse();

  match cli.command {
    Command::Analyze { file } => {
      let input = read_input(&file)?;
      print_json(&analysis::analyze_input(&input))
    }
    Command::Ingest {
      file,
      user,
      workout,
      date,
    } => {
      let input = read_input(&file)?;
      let state = connect(&config).await?;
      let report = analysis::ingest_workout(&state, user, workout, date, &input)
        .await
        .map_err(|e| anyhow!(e))?;
      print_json(&report)
    }
    Command::Show { workout } => {
      let state = connect(&config).await?;
      let analytics = analysis::get_workout_analysis(&state, workout)
        .await
        .map_err(|e| anyhow!(e))?;
      print_json(&analytics)
    }
    Command::Trend { user, as_of } => {
      let state = connect(&config).await?;
      let trend = load::get_fitness_trend(&state, user, as_of)
        .await
        .map_err(|e| anyhow!(e))?;
      print_json(&trend)
    }
    Command::Replay { user, from, to } => {
      let state = connect(&config).await?;
      let chain = load::replay_training_load(&state, user, from, to)
        .await
        .map_err(|e| anyhow!(e))?;
      print_json(&chain)
    }
  }
}

fn read_input(path: &Path) -> Result<WorkoutInput> {
  let json = fs::read_to_string(path)
    .with_context(|| format!("Failed to read {}", path.display()))?;
  WorkoutInput::from_json(&json).map_err(|e| anyhow!(e))
}

async fn connect(config: &EngineConfig) -> Result<AppState> {
  let pool = db::initialize_db(config)
    .await
    .context("Failed to initialize database")?;
  Ok(AppState::new(pool, config))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
