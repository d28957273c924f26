//! Goal progress evaluation.
//!
//! Each goal kind maps to a fixed (window, metric) pair in a dispatch table
//! built once per process. Evaluation pulls the aggregate for that pair and
//! derives percent-complete, status and days remaining from it.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::manager::GoalError;
use super::types::{Goal, GoalEvaluation, GoalKind, GoalStatus};
use crate::workouts::aggregator::{longest_streak, TimeBounds, WorkoutAggregator, WorkoutSource};

/// Quantity a goal measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalMetric {
    WorkoutCount,
    DistanceKm,
    DurationMinutes,
    StreakDays,
}

/// Range of workouts a goal looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalScope {
    /// Only workouts between the goal's start and end
    GoalWindow,
    /// Everything logged up to the goal's end
    Lifetime,
}

/// Dispatch entry for one goal kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalDefinition {
    pub metric: GoalMetric,
    pub scope: GoalScope,
    pub unit: &'static str,
    /// Length of the window ending at the end date, when the kind implies one
    pub span_days: Option<i64>,
}

/// Goal kind to definition lookup.
pub struct GoalDispatchTable {
    entries: HashMap<GoalKind, GoalDefinition>,
}

impl GoalDispatchTable {
    fn standard() -> Self {
        let entries = [
            (
                GoalKind::WeeklyWorkouts,
                GoalDefinition {
                    metric: GoalMetric::WorkoutCount,
                    scope: GoalScope::GoalWindow,
                    unit: "workouts",
                    span_days: Some(7),
                },
            ),
            (
                GoalKind::MonthlyWorkouts,
                GoalDefinition {
                    metric: GoalMetric::WorkoutCount,
                    scope: GoalScope::GoalWindow,
                    unit: "workouts",
                    span_days: Some(30),
                },
            ),
            (
                GoalKind::WeeklyDistance,
                GoalDefinition {
                    metric: GoalMetric::DistanceKm,
                    scope: GoalScope::GoalWindow,
                    unit: "km",
                    span_days: Some(7),
                },
            ),
            (
                GoalKind::MonthlyDistance,
                GoalDefinition {
                    metric: GoalMetric::DistanceKm,
                    scope: GoalScope::GoalWindow,
                    unit: "km",
                    span_days: Some(30),
                },
            ),
            (
                GoalKind::Duration,
                GoalDefinition {
                    metric: GoalMetric::DurationMinutes,
                    scope: GoalScope::GoalWindow,
                    unit: "minutes",
                    span_days: None,
                },
            ),
            (
                GoalKind::Streak,
                GoalDefinition {
                    metric: GoalMetric::StreakDays,
                    scope: GoalScope::GoalWindow,
                    unit: "days",
                    span_days: None,
                },
            ),
            (
                GoalKind::DistanceMilestone,
                GoalDefinition {
                    metric: GoalMetric::DistanceKm,
                    scope: GoalScope::Lifetime,
                    unit: "km",
                    span_days: None,
                },
            ),
        ];

        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Definition for a goal kind, `None` for kinds this build cannot measure.
    pub fn lookup(&self, kind: &GoalKind) -> Option<&GoalDefinition> {
        self.entries.get(kind)
    }
}

/// Process-wide dispatch table.
pub fn dispatch_table() -> &'static GoalDispatchTable {
    static TABLE: OnceLock<GoalDispatchTable> = OnceLock::new();
    TABLE.get_or_init(GoalDispatchTable::standard)
}

/// `round(current / target * 100)` clamped to 0-100.
pub fn progress_percent(current: f64, target: f64) -> u8 {
    if target <= 0.0 || !current.is_finite() {
        return 0;
    }
    (current / target * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Status as a pure function of progress and time.
///
/// Completion is checked before expiry, so reaching the target wins even when
/// evaluated after the end date.
pub fn derive_status(
    current: f64,
    target: f64,
    now: DateTime<Utc>,
    end_at: DateTime<Utc>,
) -> GoalStatus {
    if current >= target {
        GoalStatus::Completed
    } else if now > end_at {
        GoalStatus::Failed
    } else {
        GoalStatus::Active
    }
}

/// Whole days until `end_at`, rounded up, never negative.
pub fn days_remaining(now: DateTime<Utc>, end_at: DateTime<Utc>) -> i64 {
    let seconds = (end_at - now).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    let day = Duration::days(1).num_seconds();
    (seconds + day - 1) / day
}

/// Build the evaluation of `goal` given its measured value.
///
/// Status is recomputed from `current`, but never moves back to `Active`.
/// A stored `Completed` stays completed when later edits lower the value, and
/// a stored `Failed` becomes `Completed` once retroactive logs reach the target.
pub fn evaluation_for(goal: &Goal, current: f64, now: DateTime<Utc>) -> GoalEvaluation {
    let derived = derive_status(current, goal.target, now, goal.end_at);
    let status = match (goal.status, derived) {
        (GoalStatus::Completed, _) => GoalStatus::Completed,
        (GoalStatus::Failed, GoalStatus::Active) => GoalStatus::Failed,
        (_, derived) => derived,
    };

    GoalEvaluation {
        goal_id: goal.id,
        kind: goal.kind.clone(),
        current,
        target: goal.target,
        unit: goal.unit.clone(),
        progress_percent: progress_percent(current, goal.target),
        status,
        days_remaining: days_remaining(now, goal.end_at),
    }
}

/// Evaluates goals against a workout source.
pub struct GoalEvaluator<'a, S: WorkoutSource + ?Sized> {
    aggregator: WorkoutAggregator<'a, S>,
}

impl<'a, S: WorkoutSource + ?Sized> GoalEvaluator<'a, S> {
    pub fn new(aggregator: WorkoutAggregator<'a, S>) -> Self {
        Self { aggregator }
    }

    /// Measure the goal's current value.
    pub fn measure(&self, goal: &Goal) -> Result<f64, GoalError> {
        let definition = dispatch_table()
            .lookup(&goal.kind)
            .ok_or_else(|| GoalError::UnsupportedGoalType(goal.kind.as_str().to_string()))?;

        let bounds = match definition.scope {
            GoalScope::GoalWindow => TimeBounds {
                from: Some(goal.start_at),
                to: Some(goal.end_at),
            },
            GoalScope::Lifetime => TimeBounds {
                from: None,
                to: Some(goal.end_at),
            },
        };

        let aggregates = self.aggregator.aggregate_bounds(goal.user_id, bounds, None)?;

        let value = match definition.metric {
            GoalMetric::WorkoutCount => f64::from(aggregates.count),
            GoalMetric::DistanceKm => aggregates.total_distance_km,
            GoalMetric::DurationMinutes => aggregates.total_duration_minutes(),
            GoalMetric::StreakDays => f64::from(longest_streak(&aggregates.active_days())),
        };

        Ok(value)
    }

    /// Evaluate a goal at `now`.
    pub fn evaluate(&self, goal: &Goal, now: DateTime<Utc>) -> Result<GoalEvaluation, GoalError> {
        let current = self.measure(goal)?;
        Ok(evaluation_for(goal, current, now))
    }
}

/// Default window start for a new goal ending at `end_at`.
pub fn default_start(kind: &GoalKind, now: DateTime<Utc>, end_at: DateTime<Utc>) -> DateTime<Utc> {
    match dispatch_table().lookup(kind).and_then(|d| d.span_days) {
        Some(days) => end_at - Duration::days(days),
        None => now,
    }
}
