//! Error taxonomy surfaced by the progress engine.
//!
//! Each domain area keeps its own error enum; they all collapse into
//! [`EngineError`] at the facade. Lost conditional writes (duplicate badge
//! award, a record beaten concurrently) are not errors at all: storage
//! reports them as [`crate::storage::WriteOutcome::AlreadyHandled`].

use thiserror::Error;
use uuid::Uuid;

use crate::badges::BadgeError;
use crate::goals::GoalError;
use crate::leaderboards::LeaderboardError;
use crate::plans::PlanError;
use crate::social::{ChallengeError, FollowError};
use crate::storage::DatabaseError;
use crate::workouts::{AggregateError, WorkoutValidationError};

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before any computation
    #[error("Validation error on `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    /// Entity missing or not owned by the requester
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Stored data the engine cannot interpret (legacy goal type, ...)
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<WorkoutValidationError> for EngineError {
    fn from(err: WorkoutValidationError) -> Self {
        EngineError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl From<AggregateError> for EngineError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::InvalidWindow(message) => EngineError::Validation {
                field: "window",
                message,
            },
            AggregateError::Database(e) => EngineError::Database(e),
        }
    }
}

impl From<GoalError> for EngineError {
    fn from(err: GoalError) -> Self {
        match err {
            GoalError::Validation { field, message } => EngineError::Validation { field, message },
            GoalError::NotFound(id) => EngineError::NotFound { entity: "Goal", id },
            GoalError::UnsupportedGoalType(kind) => {
                EngineError::InconsistentState(format!("goal type '{kind}' cannot be evaluated"))
            }
            GoalError::Aggregate(e) => e.into(),
            GoalError::Database(e) => EngineError::Database(e),
        }
    }
}

impl From<PlanError> for EngineError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Validation { field, message } => EngineError::Validation { field, message },
            PlanError::UnknownTemplate {
                plan_type,
                difficulty,
            } => EngineError::Validation {
                field: "plan_type",
                message: format!("no {difficulty} template for {plan_type} plans"),
            },
            PlanError::NotFound(id) => EngineError::NotFound {
                entity: "TrainingPlan",
                id,
            },
            PlanError::Database(e) => EngineError::Database(e),
        }
    }
}

impl From<ChallengeError> for EngineError {
    fn from(err: ChallengeError) -> Self {
        match err {
            ChallengeError::Validation { field, message } => {
                EngineError::Validation { field, message }
            }
            ChallengeError::NotFound(id) => EngineError::NotFound {
                entity: "Challenge",
                id,
            },
            ChallengeError::NotParticipant { challenge_id, .. } => EngineError::NotFound {
                entity: "ChallengeParticipant",
                id: challenge_id,
            },
            ChallengeError::Aggregate(e) => e.into(),
            ChallengeError::Database(e) => EngineError::Database(e),
        }
    }
}

impl From<BadgeError> for EngineError {
    fn from(err: BadgeError) -> Self {
        match err {
            BadgeError::Aggregate(e) => e.into(),
            BadgeError::Database(e) => EngineError::Database(e),
        }
    }
}

impl From<LeaderboardError> for EngineError {
    fn from(err: LeaderboardError) -> Self {
        match err {
            LeaderboardError::Aggregate(e) => e.into(),
            LeaderboardError::Database(e) => EngineError::Database(e),
        }
    }
}

impl From<FollowError> for EngineError {
    fn from(err: FollowError) -> Self {
        match err {
            FollowError::SelfFollow(_) => EngineError::Validation {
                field: "followee_id",
                message: "users cannot follow themselves".to_string(),
            },
            FollowError::Database(e) => EngineError::Database(e),
        }
    }
}
