pub mod analysis;
pub mod breakthrough;
pub mod commands;
pub mod config;
pub mod db;
pub mod locks;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod store;
pub mod streams;
pub mod training_load;
pub mod zones;

#[cfg(test)]
mod test_utils;

pub use analysis::analyze_workout;
pub use breakthrough::ZoneBreakthroughDetector;
pub use config::EngineConfig;
pub use streams::StreamRecord;
pub use training_load::{analyze_fitness_trend, FitnessTrend, TrainingLoadTracker};
