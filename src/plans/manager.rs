//! Training plan persistence.
//!
//! Plans are stored one row per plan with the week schedule serialized as
//! JSON. Mutations load, modify and write back inside a single transaction.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc, Weekday};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::generator::PlanGenerator;
use super::tracker;
use super::types::{Difficulty, PlanStatus, PlanType, PlanWeek, TrainingPlan};
use crate::storage::database::{parse_date, parse_timestamp, parse_uuid, to_timestamp};
use crate::storage::{Database, DatabaseError, WriteOutcome};

const PLAN_COLUMNS: &str = "id, user_id, plan_type, difficulty, duration_weeks, start_date, \
                            status, current_week, progress_percentage, weeks_json, \
                            created_at, updated_at";

/// Manager for training plans.
pub struct PlanManager {
    db: Arc<Database>,
    offset: FixedOffset,
    grace_days: u32,
    generator: PlanGenerator,
}

impl PlanManager {
    pub fn new(db: Arc<Database>, offset: FixedOffset, grace_days: u32) -> Self {
        Self {
            db,
            offset,
            grace_days,
            generator: PlanGenerator::new(),
        }
    }

    fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Generate a plan and store it.
    pub fn generate(
        &self,
        user_id: Uuid,
        plan_type: PlanType,
        difficulty: Difficulty,
        duration_weeks: u32,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<TrainingPlan, PlanError> {
        let plan = self.generator.generate(
            user_id,
            plan_type,
            difficulty,
            duration_weeks,
            start_date,
            now,
        )?;

        let weeks_json = serde_json::to_string(&plan.weeks)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        self.db
            .connection()
            .execute(
                &format!(
                    "INSERT INTO training_plans ({PLAN_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    plan.id.to_string(),
                    plan.user_id.to_string(),
                    plan.plan_type.as_str(),
                    plan.difficulty.as_str(),
                    plan.duration_weeks,
                    plan.start_date.format("%Y-%m-%d").to_string(),
                    plan.status.as_str(),
                    plan.current_week,
                    plan.progress_percentage,
                    weeks_json,
                    to_timestamp(plan.created_at),
                    to_timestamp(plan.updated_at),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        info!(
            plan_id = %plan.id,
            user_id = %user_id,
            plan_type = %plan_type,
            difficulty = %difficulty,
            weeks = duration_weeks,
            "Generated training plan"
        );

        Ok(plan)
    }

    /// Get a plan owned by `requester`, failing it first if it has expired.
    pub fn get(
        &self,
        plan_id: Uuid,
        requester: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TrainingPlan, PlanError> {
        let today = self.today(now);
        self.modify(plan_id, requester, |plan| {
            Ok(tracker::refresh_status(plan, today, self.grace_days, now))
        })
        .map(|(plan, _)| plan)
    }

    /// Mark one day of the plan as done.
    pub fn complete_workout(
        &self,
        plan_id: Uuid,
        requester: Uuid,
        week_number: u32,
        day: Weekday,
        now: DateTime<Utc>,
    ) -> Result<(TrainingPlan, WriteOutcome), PlanError> {
        let today = self.today(now);
        let (plan, outcome) = self.modify(plan_id, requester, |plan| {
            tracker::refresh_status(plan, today, self.grace_days, now);
            tracker::complete_workout(plan, week_number, day, now)
        })?;
        Ok((plan, outcome))
    }

    /// Move the plan's week cursor.
    pub fn set_current_week(
        &self,
        plan_id: Uuid,
        requester: Uuid,
        week_number: u32,
        now: DateTime<Utc>,
    ) -> Result<TrainingPlan, PlanError> {
        self.modify(plan_id, requester, |plan| {
            tracker::set_current_week(plan, week_number, now).map(|()| true)
        })
        .map(|(plan, _)| plan)
    }

    /// All plans of a user, newest first. Stored status is returned as is.
    pub fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TrainingPlan>, PlanError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PLAN_COLUMNS} FROM training_plans
                 WHERE user_id = ?1 ORDER BY created_at DESC, id"
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], PlanRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut plans = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            plans.push(row.into_plan()?);
        }
        Ok(plans)
    }

    /// Load, apply `change`, and write back when it reports a modification.
    fn modify<T, F>(&self, plan_id: Uuid, requester: Uuid, change: F) -> Result<(TrainingPlan, T), PlanError>
    where
        T: Changed,
        F: FnOnce(&mut TrainingPlan) -> Result<T, PlanError>,
    {
        let mut conn = self.db.connection();
        let tx = conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let mut plan = load_plan(&tx, plan_id)?
            .filter(|p| p.user_id == requester)
            .ok_or(PlanError::NotFound(plan_id))?;

        let status_before = plan.status;
        let result = change(&mut plan);

        // A failing change may still have expired the plan; keep that.
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                if plan.status != status_before {
                    store_plan(&tx, &plan)?;
                    tx.commit()
                        .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
                }
                return Err(err);
            }
        };

        if value.changed() || plan.status != status_before {
            store_plan(&tx, &plan)?;
        }
        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Ok((plan, value))
    }
}

/// Whether a plan mutation needs to be written back.
trait Changed {
    fn changed(&self) -> bool;
}

impl Changed for bool {
    fn changed(&self) -> bool {
        *self
    }
}

impl Changed for WriteOutcome {
    fn changed(&self) -> bool {
        *self == WriteOutcome::Applied
    }
}

fn load_plan(conn: &Connection, plan_id: Uuid) -> Result<Option<TrainingPlan>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM training_plans WHERE id = ?1"),
            params![plan_id.to_string()],
            PlanRow::from_row,
        )
        .optional()
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    row.map(PlanRow::into_plan).transpose()
}

fn store_plan(conn: &Connection, plan: &TrainingPlan) -> Result<(), DatabaseError> {
    let weeks_json = serde_json::to_string(&plan.weeks)
        .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

    conn.execute(
        "UPDATE training_plans
         SET status = ?2, current_week = ?3, progress_percentage = ?4,
             weeks_json = ?5, updated_at = ?6
         WHERE id = ?1",
        params![
            plan.id.to_string(),
            plan.status.as_str(),
            plan.current_week,
            plan.progress_percentage,
            weeks_json,
            to_timestamp(plan.updated_at),
        ],
    )
    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    Ok(())
}

struct PlanRow {
    id: String,
    user_id: String,
    plan_type: String,
    difficulty: String,
    duration_weeks: u32,
    start_date: String,
    status: String,
    current_week: u32,
    progress_percentage: u8,
    weeks_json: String,
    created_at: String,
    updated_at: String,
}

impl PlanRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            plan_type: row.get(2)?,
            difficulty: row.get(3)?,
            duration_weeks: row.get(4)?,
            start_date: row.get(5)?,
            status: row.get(6)?,
            current_week: row.get(7)?,
            progress_percentage: row.get(8)?,
            weeks_json: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn into_plan(self) -> Result<TrainingPlan, DatabaseError> {
        let plan_type = PlanType::from_str(&self.plan_type).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("plan type '{}'", self.plan_type))
        })?;
        let difficulty = Difficulty::from_str(&self.difficulty).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("difficulty '{}'", self.difficulty))
        })?;
        let status = PlanStatus::from_str(&self.status).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("plan status '{}'", self.status))
        })?;
        let weeks: Vec<PlanWeek> = serde_json::from_str(&self.weeks_json)
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?;

        Ok(TrainingPlan {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            plan_type,
            difficulty,
            duration_weeks: self.duration_weeks,
            start_date: parse_date(&self.start_date)?,
            status,
            current_week: self.current_week,
            progress_percentage: self.progress_percentage,
            weeks,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Training plan errors.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("No {difficulty} template for {plan_type} plans")]
    UnknownTemplate {
        plan_type: PlanType,
        difficulty: Difficulty,
    },

    #[error("Training plan not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
