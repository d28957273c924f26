//! RustFit - Progress and achievement engine
//!
//! Turns a user's workout log into derived state: goal progress, badge
//! awards, personal records, leaderboard standings, and periodized training
//! plans with completion tracking. Storage is SQLite via rusqlite.

pub mod badges;
pub mod engine;
pub mod error;
pub mod goals;
pub mod leaderboards;
pub mod plans;
pub mod records;
pub mod social;
pub mod storage;
pub mod workouts;

// Re-export commonly used types
pub use engine::{PlanCompletion, ProgressEngine, WorkoutOutcome};
pub use error::EngineError;
pub use storage::config::AppConfig;
pub use storage::database::{Database, WriteOutcome};
pub use workouts::aggregator::WorkoutAggregator;
