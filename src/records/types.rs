//! Personal record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which way a record improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Lower is better (pace, time)
    Min,
    /// Higher is better (distance, weight)
    Max,
}

impl Direction {
    /// Whether `new` strictly beats `old`.
    pub fn is_better(&self, new: f64, old: f64) -> bool {
        match self {
            Direction::Min => new < old,
            Direction::Max => new > old,
        }
    }

    /// SQL comparison operator meaning "strictly better than".
    pub(crate) fn sql_operator(&self) -> &'static str {
        match self {
            Direction::Min => "<",
            Direction::Max => ">",
        }
    }
}

/// Record category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    Running,
    Strength,
    Cardio,
}

impl RecordCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordCategory::Running => "running",
            RecordCategory::Strength => "strength",
            RecordCategory::Cardio => "cardio",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RecordCategory::Running),
            "strength" => Some(RecordCategory::Strength),
            "cardio" => Some(RecordCategory::Cardio),
            _ => None,
        }
    }
}

/// Kind of personal record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordKind {
    /// Best average pace over a run close to 5 km
    Fastest5k,
    /// Best average pace over a run close to 10 km
    Fastest10k,
    /// Best average pace over a run close to a half marathon
    FastestHalfMarathon,
    /// Longest single run
    LongestRun,
    /// Longest single cardio session
    LongestCardio,
    /// Heaviest weight lifted for one exercise, keyed by exercise slug
    Heaviest(String),
}

impl RecordKind {
    /// Stored record type key.
    pub fn key(&self) -> String {
        match self {
            RecordKind::Fastest5k => "fastest_5k".to_string(),
            RecordKind::Fastest10k => "fastest_10k".to_string(),
            RecordKind::FastestHalfMarathon => "fastest_half_marathon".to_string(),
            RecordKind::LongestRun => "longest_run".to_string(),
            RecordKind::LongestCardio => "longest_cardio".to_string(),
            RecordKind::Heaviest(exercise) => format!("heaviest_{exercise}"),
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "fastest_5k" => Some(RecordKind::Fastest5k),
            "fastest_10k" => Some(RecordKind::Fastest10k),
            "fastest_half_marathon" => Some(RecordKind::FastestHalfMarathon),
            "longest_run" => Some(RecordKind::LongestRun),
            "longest_cardio" => Some(RecordKind::LongestCardio),
            other => other
                .strip_prefix("heaviest_")
                .filter(|exercise| !exercise.is_empty())
                .map(|exercise| RecordKind::Heaviest(exercise.to_string())),
        }
    }

    pub fn category(&self) -> RecordCategory {
        match self {
            RecordKind::Fastest5k
            | RecordKind::Fastest10k
            | RecordKind::FastestHalfMarathon
            | RecordKind::LongestRun => RecordCategory::Running,
            RecordKind::LongestCardio => RecordCategory::Cardio,
            RecordKind::Heaviest(_) => RecordCategory::Strength,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            RecordKind::Fastest5k | RecordKind::Fastest10k | RecordKind::FastestHalfMarathon => {
                Direction::Min
            }
            RecordKind::LongestRun | RecordKind::LongestCardio | RecordKind::Heaviest(_) => {
                Direction::Max
            }
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            RecordKind::Fastest5k | RecordKind::Fastest10k | RecordKind::FastestHalfMarathon => {
                "sec/km"
            }
            RecordKind::LongestRun => "km",
            RecordKind::LongestCardio => "min",
            RecordKind::Heaviest(_) => "kg",
        }
    }
}

impl TryFrom<String> for RecordKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        RecordKind::parse(&s).ok_or_else(|| format!("unknown record type '{s}'"))
    }
}

impl From<RecordKind> for String {
    fn from(kind: RecordKind) -> Self {
        kind.key()
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Best-known value for one user and record kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: RecordCategory,
    pub record_type: RecordKind,
    pub value: f64,
    pub unit: String,
    /// When the workout that set this value was performed
    pub achieved_at: DateTime<Utc>,
    /// Value this record replaced, if any
    pub previous_value: Option<f64>,
    pub improvement_percent: Option<f64>,
    pub source_workout_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// A value a workout could set a record with.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCandidate {
    pub kind: RecordKind,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_comparison() {
        assert!(Direction::Min.is_better(290.0, 310.0));
        assert!(!Direction::Min.is_better(320.0, 310.0));
        assert!(Direction::Max.is_better(12.5, 10.0));
        assert!(!Direction::Max.is_better(10.0, 10.0));
        assert_eq!(Direction::Min.sql_operator(), "<");
    }

    #[test]
    fn test_record_kind_keys() {
        let bench = RecordKind::Heaviest("bench_press".to_string());
        assert_eq!(bench.key(), "heaviest_bench_press");
        assert_eq!(RecordKind::parse("heaviest_bench_press"), Some(bench));
        assert_eq!(RecordKind::parse("heaviest_"), None);
        assert_eq!(RecordKind::parse("fastest_mile"), None);
        assert_eq!(RecordKind::Fastest5k.direction(), Direction::Min);
        assert_eq!(RecordKind::LongestRun.category(), RecordCategory::Running);
    }
}
