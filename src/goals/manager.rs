//! Goal management.
//!
//! Creates, lists, evaluates and deletes goals. Progress and status are
//! written only by evaluation; there is no operation that sets them directly.

use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::evaluator::{default_start, dispatch_table, GoalEvaluator};
use super::types::{Goal, GoalEvaluation, GoalKind, GoalStatus};
use crate::storage::database::{parse_timestamp, parse_uuid, to_timestamp};
use crate::storage::{Database, DatabaseError};
use crate::workouts::{AggregateError, WorkoutAggregator};

const GOAL_COLUMNS: &str = "id, user_id, goal_type, target, unit, start_at, end_at, \
                            current_value, status, created_at, updated_at";

/// Manager for user goals.
pub struct GoalManager<'a> {
    db: &'a Database,
    offset: FixedOffset,
}

impl<'a> GoalManager<'a> {
    /// Create a new goal manager over a database.
    pub fn new(db: &'a Database, offset: FixedOffset) -> Self {
        Self { db, offset }
    }

    fn evaluator(&self) -> GoalEvaluator<'a, Database> {
        GoalEvaluator::new(WorkoutAggregator::new(self.db, self.offset))
    }

    /// Create a new goal ending at `end_at`.
    pub fn create(
        &self,
        user_id: Uuid,
        kind: GoalKind,
        target: f64,
        end_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Goal, GoalError> {
        let definition = dispatch_table().lookup(&kind).ok_or_else(|| GoalError::Validation {
            field: "goal_type",
            message: format!("unknown goal type '{}'", kind.as_str()),
        })?;

        if !target.is_finite() || target <= 0.0 {
            return Err(GoalError::Validation {
                field: "target",
                message: "target must be a positive number".to_string(),
            });
        }

        if end_at <= now {
            return Err(GoalError::Validation {
                field: "end_date",
                message: "end date must be in the future".to_string(),
            });
        }

        let goal = Goal {
            id: Uuid::new_v4(),
            user_id,
            start_at: default_start(&kind, now, end_at),
            unit: definition.unit.to_string(),
            kind,
            target,
            end_at,
            current_value: 0.0,
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.db
            .connection()
            .execute(
                "INSERT INTO goals
                 (id, user_id, goal_type, target, unit, start_at, end_at,
                  current_value, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    goal.id.to_string(),
                    goal.user_id.to_string(),
                    goal.kind.as_str(),
                    goal.target,
                    goal.unit,
                    to_timestamp(goal.start_at),
                    to_timestamp(goal.end_at),
                    goal.current_value,
                    goal.status.as_str(),
                    to_timestamp(goal.created_at),
                    to_timestamp(goal.updated_at),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        tracing::info!(goal_id = %goal.id, user_id = %user_id, kind = goal.kind.as_str(), "Goal created");

        Ok(goal)
    }

    /// Get a goal by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<Goal>, GoalError> {
        let conn = self.db.connection();
        let row = conn
            .query_row(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"),
                params![id.to_string()],
                GoalRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(row.map(GoalRow::into_goal).transpose()?)
    }

    /// Get a goal that must belong to `requester`.
    pub fn get_owned(&self, id: Uuid, requester: Uuid) -> Result<Goal, GoalError> {
        match self.get(id)? {
            Some(goal) if goal.user_id == requester => Ok(goal),
            _ => Err(GoalError::NotFound(id)),
        }
    }

    /// Get all goals for a user, oldest first.
    pub fn get_for_user(&self, user_id: Uuid) -> Result<Vec<Goal>, GoalError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 ORDER BY created_at ASC, id ASC"
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], GoalRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut goals = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            goals.push(row.into_goal()?);
        }

        Ok(goals)
    }

    /// Evaluate a goal and cache the result on the goal row.
    pub fn evaluate(
        &self,
        id: Uuid,
        requester: Uuid,
        now: DateTime<Utc>,
    ) -> Result<GoalEvaluation, GoalError> {
        let goal = self.get_owned(id, requester)?;
        self.evaluate_goal(&goal, now)
    }

    fn evaluate_goal(&self, goal: &Goal, now: DateTime<Utc>) -> Result<GoalEvaluation, GoalError> {
        let evaluation = self.evaluator().evaluate(goal, now)?;

        if evaluation.status != goal.status {
            tracing::info!(
                goal_id = %goal.id,
                from = goal.status.as_str(),
                to = evaluation.status.as_str(),
                "Goal status changed"
            );
        }

        self.record_evaluation(&evaluation, now)?;
        Ok(evaluation)
    }

    /// Evaluate every goal of a user, keeping those matching `status_filter`.
    pub fn list(
        &self,
        user_id: Uuid,
        status_filter: Option<GoalStatus>,
        now: DateTime<Utc>,
    ) -> Result<Vec<GoalEvaluation>, GoalError> {
        let mut evaluations = Vec::new();
        for goal in self.get_for_user(user_id)? {
            let evaluation = self.evaluate_goal(&goal, now)?;
            if status_filter.map_or(true, |status| evaluation.status == status) {
                evaluations.push(evaluation);
            }
        }
        Ok(evaluations)
    }

    /// Delete a goal owned by `requester`.
    pub fn delete(&self, id: Uuid, requester: Uuid) -> Result<(), GoalError> {
        let deleted = self
            .db
            .connection()
            .execute(
                "DELETE FROM goals WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), requester.to_string()],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if deleted == 0 {
            return Err(GoalError::NotFound(id));
        }
        Ok(())
    }

    /// Persist the evaluated value. Status moves while the row is active, and a
    /// failed row may still become completed.
    fn record_evaluation(
        &self,
        evaluation: &GoalEvaluation,
        now: DateTime<Utc>,
    ) -> Result<(), GoalError> {
        self.db
            .connection()
            .execute(
                "UPDATE goals SET
                 current_value = ?1,
                 status = CASE WHEN status = 'active' OR ?2 = 'completed' THEN ?2 ELSE status END,
                 updated_at = ?3
                 WHERE id = ?4",
                params![
                    evaluation.current,
                    evaluation.status.as_str(),
                    to_timestamp(now),
                    evaluation.goal_id.to_string(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}

struct GoalRow {
    id: String,
    user_id: String,
    goal_type: String,
    target: f64,
    unit: String,
    start_at: String,
    end_at: String,
    current_value: f64,
    status: String,
    created_at: String,
    updated_at: String,
}

impl GoalRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            goal_type: row.get(2)?,
            target: row.get(3)?,
            unit: row.get(4)?,
            start_at: row.get(5)?,
            end_at: row.get(6)?,
            current_value: row.get(7)?,
            status: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_goal(self) -> Result<Goal, DatabaseError> {
        let status = GoalStatus::from_str(&self.status).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("goal status '{}'", self.status))
        })?;

        Ok(Goal {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            kind: GoalKind::parse(&self.goal_type),
            target: self.target,
            unit: self.unit,
            start_at: parse_timestamp(&self.start_at)?,
            end_at: parse_timestamp(&self.end_at)?,
            current_value: self.current_value,
            status,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Goal management errors.
#[derive(Debug, thiserror::Error)]
pub enum GoalError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("Validation error on `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Goal not found: {0}")]
    NotFound(Uuid),

    #[error("Goal type '{0}' has no aggregation")]
    UnsupportedGoalType(String),
}
