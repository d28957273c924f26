//! Plan completion tracking.
//!
//! Pure state transitions on a loaded [`TrainingPlan`]. Persistence is the
//! manager's job.

use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use tracing::{debug, info};

use super::manager::PlanError;
use super::types::{PlanStatus, TrainingPlan};
use crate::storage::WriteOutcome;

/// Percentage of non-rest workouts completed, rounded to the nearest integer.
pub fn progress_percentage(plan: &TrainingPlan) -> u8 {
    let total = plan.total_sessions();
    if total == 0 {
        return 0;
    }
    let done = plan.completed_sessions();
    ((done as f64 * 100.0 / total as f64).round() as u8).min(100)
}

/// Mark the workout on `day` of week `week_number` as done.
///
/// Completing a workout that is already done is a no-op. Completing the last
/// outstanding workout moves the plan to `Completed`.
pub fn complete_workout(
    plan: &mut TrainingPlan,
    week_number: u32,
    day: Weekday,
    now: DateTime<Utc>,
) -> Result<WriteOutcome, PlanError> {
    if plan.status == PlanStatus::Failed {
        return Err(PlanError::Validation {
            field: "status",
            message: "plan has failed; generate a new plan to retry".to_string(),
        });
    }

    let plan_id = plan.id;
    let week = plan
        .weeks
        .iter_mut()
        .find(|w| w.week_number == week_number)
        .ok_or_else(|| PlanError::Validation {
            field: "week_number",
            message: format!("week {week_number} is not part of this plan"),
        })?;

    let workout = week
        .workouts
        .iter_mut()
        .find(|w| w.day == day)
        .ok_or_else(|| PlanError::Validation {
            field: "day",
            message: format!("no workout on {day} in week {week_number}"),
        })?;

    if workout.is_rest() {
        return Err(PlanError::Validation {
            field: "day",
            message: format!("{day} of week {week_number} is a rest day"),
        });
    }

    if workout.completed {
        debug!(plan_id = %plan_id, week_number, %day, "Workout already completed");
        return Ok(WriteOutcome::AlreadyHandled);
    }

    workout.completed = true;
    workout.completed_at = Some(now);

    plan.progress_percentage = progress_percentage(plan);
    plan.updated_at = now;

    if plan.completed_sessions() == plan.total_sessions() && plan.status == PlanStatus::Active {
        plan.status = PlanStatus::Completed;
        info!(plan_id = %plan_id, "Training plan completed");
    }

    Ok(WriteOutcome::Applied)
}

/// Move the week cursor. Does not affect completion.
pub fn set_current_week(
    plan: &mut TrainingPlan,
    week_number: u32,
    now: DateTime<Utc>,
) -> Result<(), PlanError> {
    if week_number == 0 || week_number > plan.duration_weeks {
        return Err(PlanError::Validation {
            field: "week_number",
            message: format!("week must be between 1 and {}", plan.duration_weeks),
        });
    }

    if plan.current_week != week_number {
        plan.current_week = week_number;
        plan.updated_at = now;
    }
    Ok(())
}

/// Fail an active plan once its end date plus `grace_days` has passed.
///
/// Returns whether the status changed.
pub fn refresh_status(
    plan: &mut TrainingPlan,
    today: NaiveDate,
    grace_days: u32,
    now: DateTime<Utc>,
) -> bool {
    if plan.status != PlanStatus::Active {
        return false;
    }

    let deadline = plan.end_date() + Duration::days(i64::from(grace_days));
    if today <= deadline {
        return false;
    }

    plan.status = PlanStatus::Failed;
    plan.updated_at = now;
    info!(plan_id = %plan.id, %deadline, "Training plan expired");
    true
}
