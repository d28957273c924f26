//! Training plan type definitions.

use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of plan, usually named after the target race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    #[serde(rename = "5k")]
    FiveK,
    #[serde(rename = "10k")]
    TenK,
    #[serde(rename = "half_marathon")]
    HalfMarathon,
    #[serde(rename = "marathon")]
    Marathon,
    #[serde(rename = "strength")]
    Strength,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::FiveK => "5k",
            PlanType::TenK => "10k",
            PlanType::HalfMarathon => "half_marathon",
            PlanType::Marathon => "marathon",
            PlanType::Strength => "strength",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "5k" => Some(PlanType::FiveK),
            "10k" => Some(PlanType::TenK),
            "half_marathon" => Some(PlanType::HalfMarathon),
            "marathon" => Some(PlanType::Marathon),
            "strength" => Some(PlanType::Strength),
            _ => None,
        }
    }

    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanType::FiveK => "5K",
            PlanType::TenK => "10K",
            PlanType::HalfMarathon => "Half Marathon",
            PlanType::Marathon => "Marathon",
            PlanType::Strength => "Strength",
        }
    }

    pub fn all() -> [PlanType; 5] {
        [
            PlanType::FiveK,
            PlanType::TenK,
            PlanType::HalfMarathon,
            PlanType::Marathon,
            PlanType::Strength,
        ]
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Difficulty level of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }

    pub fn all() -> [Difficulty; 3] {
        [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Advanced]
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Periodization phase of a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Base,
    Build,
    Peak,
    Taper,
}

/// Kind of session prescribed on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Rest,
    Easy,
    Recovery,
    Tempo,
    Intervals,
    Long,
    Strength,
    CrossTrain,
}

impl SessionKind {
    pub fn is_rest(&self) -> bool {
        matches!(self, SessionKind::Rest)
    }

    /// Default intensity of the session.
    pub fn intensity(&self) -> Intensity {
        match self {
            SessionKind::Rest => Intensity::Rest,
            SessionKind::Easy | SessionKind::Recovery | SessionKind::CrossTrain => Intensity::Easy,
            SessionKind::Long | SessionKind::Tempo | SessionKind::Strength => Intensity::Moderate,
            SessionKind::Intervals => Intensity::Hard,
        }
    }
}

/// Intensity label of a prescribed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Rest,
    Easy,
    Moderate,
    Hard,
}

/// One prescribed day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanWorkout {
    pub day: Weekday,
    pub date: NaiveDate,
    pub session: SessionKind,
    pub duration_minutes: u32,
    pub distance_km: Option<f64>,
    pub intensity: Intensity,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PlanWorkout {
    pub fn is_rest(&self) -> bool {
        self.session.is_rest()
    }
}

/// One week of a plan, always seven days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanWeek {
    /// 1-based week number
    pub week_number: u32,
    pub phase: Phase,
    pub start_date: NaiveDate,
    /// Prescribed volume in the template's unit (km, or minutes for strength)
    pub target_volume: f64,
    pub workouts: Vec<PlanWorkout>,
}

/// Plan status.
///
/// `Completed` and `Failed` are terminal; retrying means generating a new plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Completed,
    Failed,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Completed => "completed",
            PlanStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PlanStatus::Active),
            "completed" => Some(PlanStatus::Completed),
            "failed" => Some(PlanStatus::Failed),
            _ => None,
        }
    }
}

/// A generated multi-week training plan.
///
/// Weeks and workouts are fixed at generation. Afterwards only completion
/// flags, `current_week`, `status` and `progress_percentage` change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_type: PlanType,
    pub difficulty: Difficulty,
    pub duration_weeks: u32,
    pub start_date: NaiveDate,
    pub status: PlanStatus,
    /// User-navigable week cursor, 1-based
    pub current_week: u32,
    pub progress_percentage: u8,
    pub weeks: Vec<PlanWeek>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrainingPlan {
    /// First day after the plan.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Duration::weeks(i64::from(self.duration_weeks))
    }

    /// All non-rest workouts.
    pub fn sessions(&self) -> impl Iterator<Item = &PlanWorkout> {
        self.weeks
            .iter()
            .flat_map(|w| w.workouts.iter())
            .filter(|w| !w.is_rest())
    }

    pub fn total_sessions(&self) -> usize {
        self.sessions().count()
    }

    pub fn completed_sessions(&self) -> usize {
        self.sessions().filter(|w| w.completed).count()
    }
}
