//! Goal type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user goal measured against their workout log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier
    pub id: Uuid,
    /// User who owns this goal
    pub user_id: Uuid,
    /// Kind of goal, selects how progress is measured
    pub kind: GoalKind,
    /// Target value (always positive)
    pub target: f64,
    /// Unit of `target` and `current_value`
    pub unit: String,
    /// Start of the goal window
    pub start_at: DateTime<Utc>,
    /// End of the goal window
    pub end_at: DateTime<Utc>,
    /// Last evaluated value (cache; recomputed on every evaluation)
    pub current_value: f64,
    /// Last evaluated status
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of goal.
///
/// Unknown strings read back from storage become `Legacy` so a single stale
/// row can be reported instead of failing the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GoalKind {
    /// Number of workouts within a week
    WeeklyWorkouts,
    /// Number of workouts within a month
    MonthlyWorkouts,
    /// Distance within a week
    WeeklyDistance,
    /// Distance within a month
    MonthlyDistance,
    /// Total training minutes within the goal window
    Duration,
    /// Consecutive active days within the goal window
    Streak,
    /// Lifetime distance reached by the end date
    DistanceMilestone,
    /// Kind no longer (or never) supported by this build
    Legacy(String),
}

impl GoalKind {
    pub fn as_str(&self) -> &str {
        match self {
            GoalKind::WeeklyWorkouts => "weekly_workouts",
            GoalKind::MonthlyWorkouts => "monthly_workouts",
            GoalKind::WeeklyDistance => "weekly_distance",
            GoalKind::MonthlyDistance => "monthly_distance",
            GoalKind::Duration => "duration",
            GoalKind::Streak => "streak",
            GoalKind::DistanceMilestone => "distance_milestone",
            GoalKind::Legacy(name) => name,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "weekly_workouts" => GoalKind::WeeklyWorkouts,
            "monthly_workouts" => GoalKind::MonthlyWorkouts,
            "weekly_distance" => GoalKind::WeeklyDistance,
            "monthly_distance" => GoalKind::MonthlyDistance,
            "duration" => GoalKind::Duration,
            "streak" => GoalKind::Streak,
            "distance_milestone" => GoalKind::DistanceMilestone,
            other => GoalKind::Legacy(other.to_string()),
        }
    }

    /// Get display name for the goal kind.
    pub fn display_name(&self) -> &str {
        match self {
            GoalKind::WeeklyWorkouts => "Weekly Workouts",
            GoalKind::MonthlyWorkouts => "Monthly Workouts",
            GoalKind::WeeklyDistance => "Weekly Distance",
            GoalKind::MonthlyDistance => "Monthly Distance",
            GoalKind::Duration => "Training Time",
            GoalKind::Streak => "Streak",
            GoalKind::DistanceMilestone => "Distance Milestone",
            GoalKind::Legacy(name) => name,
        }
    }
}

impl From<String> for GoalKind {
    fn from(s: String) -> Self {
        GoalKind::parse(&s)
    }
}

impl From<GoalKind> for String {
    fn from(kind: GoalKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Status of a goal.
///
/// `Completed` and `Failed` are terminal; retrying means creating a new goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Failed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GoalStatus::Active),
            "completed" => Some(GoalStatus::Completed),
            "failed" => Some(GoalStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of evaluating a goal at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalEvaluation {
    pub goal_id: Uuid,
    pub kind: GoalKind,
    pub current: f64,
    pub target: f64,
    pub unit: String,
    /// Percent complete, 0-100
    pub progress_percent: u8,
    pub status: GoalStatus,
    /// Whole days left until the end date, never negative
    pub days_remaining: i64,
}
