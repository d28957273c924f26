//! Workout log types and windowed aggregation.

pub mod aggregator;
pub mod types;

pub use aggregator::{
    AggregateError, TimeBounds, TimeRange, Window, WorkoutAggregates, WorkoutAggregator,
    WorkoutQuery, WorkoutSource,
};
pub use types::{
    BiometricDetails, CardioDetails, ExerciseSet, LiftDetails, RunDetails, WorkoutKind,
    WorkoutPayload, WorkoutRecord, WorkoutValidationError,
};
