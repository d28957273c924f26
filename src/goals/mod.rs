//! Training goals module.
//!
//! Goals are time-boxed targets (weekly workouts, monthly distance, streaks,
//! lifetime milestones) evaluated against the workout log on demand.

pub mod evaluator;
pub mod manager;
pub mod types;

// Re-exports for convenience
pub use evaluator::{dispatch_table, GoalDefinition, GoalEvaluator, GoalMetric, GoalScope};
pub use manager::{GoalError, GoalManager};
pub use types::{Goal, GoalEvaluation, GoalKind, GoalStatus};
