//! Challenge management.
//!
//! Handles challenge creation, joining and progress sync. Progress is never
//! incremented by callers: a sync re-projects the participant's workouts onto
//! the challenge metric and window, so running it twice gives the same
//! snapshot.

use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;
use uuid::Uuid;

use super::types::{Challenge, ChallengeParticipant, NewChallenge};
use crate::leaderboards::rankings::{rank_standings, LeaderboardEntry, LeaderboardMetric, Standing};
use crate::storage::database::{parse_timestamp, parse_uuid, to_timestamp};
use crate::storage::{Database, DatabaseError, WriteOutcome};
use crate::workouts::{AggregateError, TimeBounds, WorkoutAggregator};

const CHALLENGE_COLUMNS: &str =
    "id, name, description, metric, target, start_at, end_at, created_by, created_at";

const PARTICIPANT_COLUMNS: &str =
    "challenge_id, user_id, joined_at, progress, progress_reached_at, completed_at, synced_at";

/// Challenge manager.
pub struct ChallengeManager {
    db: Arc<Database>,
    offset: FixedOffset,
}

impl ChallengeManager {
    /// Create a new challenge manager.
    pub fn new(db: Arc<Database>, offset: FixedOffset) -> Self {
        Self { db, offset }
    }

    /// Create a new challenge.
    pub fn create_challenge(
        &self,
        created_by: Uuid,
        new: NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<Challenge, ChallengeError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(ChallengeError::Validation {
                field: "name",
                message: "challenge needs a name".to_string(),
            });
        }
        if !new.target.is_finite() || new.target <= 0.0 {
            return Err(ChallengeError::Validation {
                field: "target",
                message: "target must be a positive number".to_string(),
            });
        }
        if new.end_at <= new.start_at {
            return Err(ChallengeError::Validation {
                field: "end_date",
                message: "end date must be after the start date".to_string(),
            });
        }
        if new.end_at <= now {
            return Err(ChallengeError::Validation {
                field: "end_date",
                message: "end date must be in the future".to_string(),
            });
        }

        let challenge = Challenge {
            id: Uuid::new_v4(),
            name,
            description: new.description,
            metric: new.metric,
            target: new.target,
            start_at: new.start_at,
            end_at: new.end_at,
            created_by,
            created_at: now,
        };

        self.db
            .connection()
            .execute(
                "INSERT INTO challenges (id, name, description, metric, target, start_at, end_at, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    challenge.id.to_string(),
                    challenge.name,
                    challenge.description,
                    challenge.metric.as_str(),
                    challenge.target,
                    to_timestamp(challenge.start_at),
                    to_timestamp(challenge.end_at),
                    challenge.created_by.to_string(),
                    to_timestamp(challenge.created_at),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        tracing::info!(challenge_id = %challenge.id, name = %challenge.name, "Challenge created");

        Ok(challenge)
    }

    /// Get a challenge by ID.
    pub fn get_challenge(&self, challenge_id: Uuid) -> Result<Challenge, ChallengeError> {
        let row = self
            .db
            .connection()
            .query_row(
                &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = ?1"),
                params![challenge_id.to_string()],
                ChallengeRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => Ok(row.into_challenge()?),
            None => Err(ChallengeError::NotFound(challenge_id)),
        }
    }

    /// Join a challenge. Joining twice is a no-op.
    pub fn join_challenge(
        &self,
        challenge_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome, ChallengeError> {
        let challenge = self.get_challenge(challenge_id)?;
        if !challenge.is_open(now) {
            return Err(ChallengeError::Validation {
                field: "challenge_id",
                message: "challenge has already ended".to_string(),
            });
        }

        let changes = self
            .db
            .connection()
            .execute(
                "INSERT OR IGNORE INTO challenge_participants
                 (id, challenge_id, user_id, joined_at, progress, synced_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    challenge_id.to_string(),
                    user_id.to_string(),
                    to_timestamp(now),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let outcome = WriteOutcome::from_changes(changes);
        if outcome == WriteOutcome::Applied {
            tracing::info!(challenge_id = %challenge_id, user_id = %user_id, "Joined challenge");
        }
        Ok(outcome)
    }

    /// Get a participant's stored snapshot.
    pub fn get_progress(
        &self,
        challenge_id: Uuid,
        user_id: Uuid,
    ) -> Result<ChallengeParticipant, ChallengeError> {
        let row = self
            .db
            .connection()
            .query_row(
                &format!(
                    "SELECT {PARTICIPANT_COLUMNS} FROM challenge_participants
                     WHERE challenge_id = ?1 AND user_id = ?2"
                ),
                params![challenge_id.to_string(), user_id.to_string()],
                ParticipantRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => Ok(row.into_participant()?),
            None => Err(ChallengeError::NotParticipant {
                challenge_id,
                user_id,
            }),
        }
    }

    /// Recompute a participant's progress from their workouts.
    ///
    /// Completion is recorded the first time progress reaches the target and
    /// kept from then on.
    pub fn sync_progress(
        &self,
        challenge_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ChallengeParticipant, ChallengeError> {
        let challenge = self.get_challenge(challenge_id)?;
        // Fails with NotParticipant before any aggregation
        self.get_progress(challenge_id, user_id)?;

        let aggregator = WorkoutAggregator::new(self.db.as_ref(), self.offset);
        let bounds = TimeBounds {
            from: Some(challenge.start_at),
            to: Some(challenge.end_at),
        };
        let aggregates = aggregator.aggregate_bounds(user_id, bounds, None)?;
        let progress = challenge.metric.value(&aggregates);
        let reached = progress >= challenge.target;

        self.db
            .connection()
            .execute(
                "UPDATE challenge_participants SET
                 progress = ?3,
                 progress_reached_at = ?4,
                 completed_at = COALESCE(completed_at, ?5),
                 synced_at = ?6
                 WHERE challenge_id = ?1 AND user_id = ?2",
                params![
                    challenge_id.to_string(),
                    user_id.to_string(),
                    progress,
                    aggregates.last_workout_at.map(to_timestamp),
                    reached.then(|| to_timestamp(now)),
                    to_timestamp(now),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let participant = self.get_progress(challenge_id, user_id)?;
        if reached {
            tracing::debug!(challenge_id = %challenge_id, user_id = %user_id, "Challenge target reached");
        }
        Ok(participant)
    }

    /// All participants of a challenge.
    pub fn participants(&self, challenge_id: Uuid) -> Result<Vec<ChallengeParticipant>, ChallengeError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PARTICIPANT_COLUMNS} FROM challenge_participants
                 WHERE challenge_id = ?1 ORDER BY joined_at, user_id"
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![challenge_id.to_string()], ParticipantRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut participants = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            participants.push(row.into_participant()?);
        }
        Ok(participants)
    }

    /// Rank participants by their last synced progress.
    pub fn leaderboard(
        &self,
        challenge_id: Uuid,
        requester: Uuid,
    ) -> Result<Vec<LeaderboardEntry>, ChallengeError> {
        self.get_challenge(challenge_id)?;

        let standings = self
            .participants(challenge_id)?
            .into_iter()
            .map(|p| Standing {
                user_id: p.user_id,
                value: p.progress,
                reached_at: p.progress_reached_at,
            })
            .collect();

        Ok(rank_standings(standings, requester))
    }

    /// Challenges a user has joined that have not ended yet.
    pub fn get_active_challenges(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Challenge, ChallengeParticipant)>, ChallengeError> {
        let ids: Vec<String> = {
            let conn = self.db.connection();
            let mut stmt = conn
                .prepare(
                    "SELECT c.id FROM challenges c
                     JOIN challenge_participants p ON c.id = p.challenge_id
                     WHERE p.user_id = ?1 AND c.end_at > ?2
                     ORDER BY c.end_at, c.id",
                )
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            let rows = stmt
                .query_map(params![user_id.to_string(), to_timestamp(now)], |row| {
                    row.get::<_, String>(0)
                })
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            let ids = rows
                .collect::<Result<Vec<String>, _>>()
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            ids
        };

        let mut results = Vec::new();
        for id in ids {
            let challenge_id = parse_uuid(&id)?;
            let challenge = self.get_challenge(challenge_id)?;
            let progress = self.get_progress(challenge_id, user_id)?;
            results.push((challenge, progress));
        }
        Ok(results)
    }
}

struct ChallengeRow {
    id: String,
    name: String,
    description: Option<String>,
    metric: String,
    target: f64,
    start_at: String,
    end_at: String,
    created_by: String,
    created_at: String,
}

impl ChallengeRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            metric: row.get(3)?,
            target: row.get(4)?,
            start_at: row.get(5)?,
            end_at: row.get(6)?,
            created_by: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_challenge(self) -> Result<Challenge, DatabaseError> {
        let metric = LeaderboardMetric::from_str(&self.metric).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("challenge metric '{}'", self.metric))
        })?;

        Ok(Challenge {
            id: parse_uuid(&self.id)?,
            name: self.name,
            description: self.description,
            metric,
            target: self.target,
            start_at: parse_timestamp(&self.start_at)?,
            end_at: parse_timestamp(&self.end_at)?,
            created_by: parse_uuid(&self.created_by)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

struct ParticipantRow {
    challenge_id: String,
    user_id: String,
    joined_at: String,
    progress: f64,
    progress_reached_at: Option<String>,
    completed_at: Option<String>,
    synced_at: String,
}

impl ParticipantRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            challenge_id: row.get(0)?,
            user_id: row.get(1)?,
            joined_at: row.get(2)?,
            progress: row.get(3)?,
            progress_reached_at: row.get(4)?,
            completed_at: row.get(5)?,
            synced_at: row.get(6)?,
        })
    }

    fn into_participant(self) -> Result<ChallengeParticipant, DatabaseError> {
        Ok(ChallengeParticipant {
            challenge_id: parse_uuid(&self.challenge_id)?,
            user_id: parse_uuid(&self.user_id)?,
            joined_at: parse_timestamp(&self.joined_at)?,
            progress: self.progress,
            progress_reached_at: self
                .progress_reached_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            completed_at: self.completed_at.as_deref().map(parse_timestamp).transpose()?,
            synced_at: parse_timestamp(&self.synced_at)?,
        })
    }
}

/// Challenge errors.
#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error("Validation error on `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Challenge not found: {0}")]
    NotFound(Uuid),

    #[error("User {user_id} has not joined challenge {challenge_id}")]
    NotParticipant { challenge_id: Uuid, user_id: Uuid },

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
