//! Social type definitions.
//!
//! Defines challenges and challenge participation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leaderboards::LeaderboardMetric;

/// Parameters for a new challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChallenge {
    pub name: String,
    pub description: Option<String>,
    pub metric: LeaderboardMetric,
    pub target: f64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Challenge definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Metric workouts are projected onto
    pub metric: LeaderboardMetric,
    pub target: f64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.end_at
    }
}

/// A user's participation in a challenge.
///
/// `progress` is a snapshot; syncing recomputes it from the workout log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeParticipant {
    pub challenge_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
    pub progress: f64,
    /// Timestamp of the last workout counted in `progress`
    pub progress_reached_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub synced_at: DateTime<Utc>,
}

impl ChallengeParticipant {
    pub fn completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
