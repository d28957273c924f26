//! Workout record types.
//!
//! A workout is a dated training (or biometric) log entry owned by one user.
//! The type-specific details live in a tagged payload so aggregation and
//! record detection can match on it exhaustively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Kind of workout, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutKind {
    Run,
    Lift,
    Cardio,
    Biometrics,
}

impl WorkoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutKind::Run => "run",
            WorkoutKind::Lift => "lift",
            WorkoutKind::Cardio => "cardio",
            WorkoutKind::Biometrics => "biometrics",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "run" => Some(WorkoutKind::Run),
            "lift" => Some(WorkoutKind::Lift),
            "cardio" => Some(WorkoutKind::Cardio),
            "biometrics" => Some(WorkoutKind::Biometrics),
            _ => None,
        }
    }

    /// Whether this kind counts as training load.
    ///
    /// Biometric logs are physiological measurements, so they are left out of
    /// volume totals and streaks unless a caller asks for them by kind.
    pub fn is_training(&self) -> bool {
        !matches!(self, WorkoutKind::Biometrics)
    }
}

impl std::fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Running details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetails {
    /// Distance covered in kilometers
    pub distance_km: f64,
    /// Average pace in seconds per kilometer (derived from duration when absent)
    #[serde(default)]
    pub avg_pace_sec_per_km: Option<f64>,
    #[serde(default)]
    pub avg_heart_rate: Option<u8>,
    #[serde(default)]
    pub elevation_gain_m: Option<f64>,
}

/// A single exercise within a lifting session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub name: String,
    pub sets: u16,
    pub reps: u16,
    /// Working weight in kilograms
    pub weight_kg: f64,
}

/// Strength training details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftDetails {
    pub exercises: Vec<ExerciseSet>,
}

/// Generic cardio details (bike, row, swim, elliptical...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardioDetails {
    pub activity: String,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub avg_heart_rate: Option<u8>,
    #[serde(default)]
    pub calories: Option<u32>,
}

/// Physiological measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricDetails {
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub resting_heart_rate: Option<u8>,
    #[serde(default)]
    pub body_fat_percent: Option<f64>,
}

/// Type-specific workout payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutPayload {
    Run(RunDetails),
    Lift(LiftDetails),
    Cardio(CardioDetails),
    Biometrics(BiometricDetails),
}

impl WorkoutPayload {
    pub fn kind(&self) -> WorkoutKind {
        match self {
            WorkoutPayload::Run(_) => WorkoutKind::Run,
            WorkoutPayload::Lift(_) => WorkoutKind::Lift,
            WorkoutPayload::Cardio(_) => WorkoutKind::Cardio,
            WorkoutPayload::Biometrics(_) => WorkoutKind::Biometrics,
        }
    }
}

/// A logged workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// When the workout took place
    pub performed_at: DateTime<Utc>,
    /// Total duration in seconds
    pub duration_seconds: u32,
    /// Rate of perceived exertion (1-10)
    #[serde(default)]
    pub rpe: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Type-specific details
    pub payload: WorkoutPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutRecord {
    /// Create a new workout record.
    pub fn new(
        user_id: Uuid,
        performed_at: DateTime<Utc>,
        duration_seconds: u32,
        payload: WorkoutPayload,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            performed_at,
            duration_seconds,
            rpe: None,
            notes: None,
            payload,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> WorkoutKind {
        self.payload.kind()
    }

    /// Distance covered, for kinds that cover one.
    pub fn distance_km(&self) -> Option<f64> {
        match &self.payload {
            WorkoutPayload::Run(run) => Some(run.distance_km),
            WorkoutPayload::Cardio(cardio) => cardio.distance_km,
            WorkoutPayload::Lift(_) | WorkoutPayload::Biometrics(_) => None,
        }
    }

    /// Average pace in seconds per kilometer for runs.
    ///
    /// Uses the logged pace when present, otherwise duration / distance.
    pub fn run_pace_sec_per_km(&self) -> Option<f64> {
        match &self.payload {
            WorkoutPayload::Run(run) => run.avg_pace_sec_per_km.or_else(|| {
                (run.distance_km > 0.0).then(|| self.duration_seconds as f64 / run.distance_km)
            }),
            _ => None,
        }
    }

    /// Check the record for values that cannot be aggregated.
    pub fn validate(&self) -> Result<(), WorkoutValidationError> {
        if let Some(rpe) = self.rpe {
            if !(1..=10).contains(&rpe) {
                return Err(WorkoutValidationError::new("rpe", "must be between 1 and 10"));
            }
        }

        match &self.payload {
            WorkoutPayload::Biometrics(bio) => {
                if bio.weight_kg.is_none()
                    && bio.resting_heart_rate.is_none()
                    && bio.body_fat_percent.is_none()
                {
                    return Err(WorkoutValidationError::new(
                        "payload",
                        "biometrics entry has no measurements",
                    ));
                }
                return Ok(());
            }
            WorkoutPayload::Run(run) => {
                if !run.distance_km.is_finite() || run.distance_km < 0.0 {
                    return Err(WorkoutValidationError::new(
                        "distance_km",
                        "must be a non-negative number",
                    ));
                }
                if matches!(run.avg_pace_sec_per_km, Some(p) if !p.is_finite() || p <= 0.0) {
                    return Err(WorkoutValidationError::new(
                        "avg_pace_sec_per_km",
                        "must be positive",
                    ));
                }
            }
            WorkoutPayload::Lift(lift) => {
                if lift.exercises.is_empty() {
                    return Err(WorkoutValidationError::new(
                        "exercises",
                        "lift needs at least one exercise",
                    ));
                }
                if lift
                    .exercises
                    .iter()
                    .any(|e| !e.weight_kg.is_finite() || e.weight_kg < 0.0 || e.name.trim().is_empty())
                {
                    return Err(WorkoutValidationError::new(
                        "exercises",
                        "exercise needs a name and a non-negative weight",
                    ));
                }
            }
            WorkoutPayload::Cardio(cardio) => {
                if matches!(cardio.distance_km, Some(d) if !d.is_finite() || d < 0.0) {
                    return Err(WorkoutValidationError::new(
                        "distance_km",
                        "must be a non-negative number",
                    ));
                }
            }
        }

        if self.duration_seconds == 0 {
            return Err(WorkoutValidationError::new(
                "duration_seconds",
                "training workouts need a positive duration",
            ));
        }

        Ok(())
    }
}

/// Rejected workout field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid workout field `{field}`: {message}")]
pub struct WorkoutValidationError {
    pub field: &'static str,
    pub message: String,
}

impl WorkoutValidationError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}
