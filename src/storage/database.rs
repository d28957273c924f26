//! Database operations using rusqlite.
//!
//! Owns the SQLite connection, schema migration, and the workout log. The
//! connection sits behind a mutex so a single `Database` can be shared via
//! `Arc` between request handlers; each operation holds the lock for its
//! whole statement sequence.

use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use crate::workouts::aggregator::{TimeBounds, WorkoutQuery, WorkoutSource};
use crate::workouts::types::{WorkoutKind, WorkoutPayload, WorkoutRecord};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use uuid::Uuid;

/// Result of a conditional write.
///
/// `AlreadyHandled` means the storage layer refused the write because an equal
/// or better row already exists. Callers treat it as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    AlreadyHandled,
}

impl WriteOutcome {
    pub fn from_changes(changes: usize) -> Self {
        if changes > 0 {
            WriteOutcome::Applied
        } else {
            WriteOutcome::AlreadyHandled
        }
    }
}

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        let conn = self.connection();

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        // Create schema version table
        conn.execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = get_schema_version(&conn)?;

        if current_version < CURRENT_VERSION {
            migrate(&conn, current_version)?;
        }

        Ok(())
    }

    /// Lock and return the underlying connection.
    ///
    /// A panic while holding the lock cannot leave SQLite half-written (every
    /// multi-statement write runs in a transaction), so a poisoned lock is
    /// recovered rather than propagated.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the current schema version.
    pub fn schema_version(&self) -> Result<i32, DatabaseError> {
        get_schema_version(&self.connection())
    }

    // ========== Workout CRUD Operations ==========

    /// Insert a new workout into the database.
    pub fn insert_workout(&self, workout: &WorkoutRecord) -> Result<(), DatabaseError> {
        let payload_json = serde_json::to_string(&workout.payload)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        self.connection()
            .execute(
                "INSERT INTO workouts (id, user_id, kind, performed_at, duration_seconds, rpe,
                 notes, payload_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    workout.id.to_string(),
                    workout.user_id.to_string(),
                    workout.kind().as_str(),
                    to_timestamp(workout.performed_at),
                    workout.duration_seconds,
                    workout.rpe,
                    workout.notes,
                    payload_json,
                    to_timestamp(workout.created_at),
                    to_timestamp(workout.updated_at),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Get a workout by ID.
    pub fn get_workout(&self, id: &Uuid) -> Result<Option<WorkoutRecord>, DatabaseError> {
        let conn = self.connection();
        let row = conn
            .query_row(
                &format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = ?1"),
                params![id.to_string()],
                WorkoutRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(WorkoutRow::into_record).transpose()
    }

    /// Update an existing workout.
    ///
    /// Aggregates are always recomputed from this table, so an edit is visible
    /// to the next evaluation without any cache invalidation.
    pub fn update_workout(&self, workout: &WorkoutRecord) -> Result<(), DatabaseError> {
        let payload_json = serde_json::to_string(&workout.payload)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        let rows_affected = self
            .connection()
            .execute(
                "UPDATE workouts SET kind = ?1, performed_at = ?2, duration_seconds = ?3,
                 rpe = ?4, notes = ?5, payload_json = ?6, updated_at = ?7
                 WHERE id = ?8 AND user_id = ?9",
                params![
                    workout.kind().as_str(),
                    to_timestamp(workout.performed_at),
                    workout.duration_seconds,
                    workout.rpe,
                    workout.notes,
                    payload_json,
                    to_timestamp(Utc::now()),
                    workout.id.to_string(),
                    workout.user_id.to_string(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Workout {}", workout.id)));
        }

        Ok(())
    }

    /// Delete a workout owned by `user_id`. Returns whether a row was removed.
    pub fn delete_workout(&self, id: &Uuid, user_id: &Uuid) -> Result<bool, DatabaseError> {
        let rows_affected = self
            .connection()
            .execute(
                "DELETE FROM workouts WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id.to_string()],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(rows_affected > 0)
    }

    /// Users with at least one workout of a training kind inside the bounds.
    pub fn users_with_training(&self, bounds: TimeBounds) -> Result<Vec<Uuid>, DatabaseError> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT user_id FROM workouts
                 WHERE kind != 'biometrics'
                   AND (?1 IS NULL OR performed_at >= ?1)
                   AND (?2 IS NULL OR performed_at < ?2)
                 ORDER BY user_id",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![bounds.from.map(to_timestamp), bounds.to.map(to_timestamp)],
                |row| row.get::<_, String>(0),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut users = Vec::new();
        for row in rows {
            let id = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            users.push(parse_uuid(&id)?);
        }

        Ok(users)
    }
}

impl WorkoutSource for Database {
    fn find_workouts(
        &self,
        user_id: Uuid,
        query: &WorkoutQuery,
    ) -> Result<Vec<WorkoutRecord>, DatabaseError> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {WORKOUT_COLUMNS} FROM workouts
                 WHERE user_id = ?1
                   AND (?2 IS NULL OR performed_at >= ?2)
                   AND (?3 IS NULL OR performed_at < ?3)
                   AND (?4 IS NULL OR kind = ?4)
                 ORDER BY performed_at ASC, id ASC"
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![
                    user_id.to_string(),
                    query.from.map(to_timestamp),
                    query.to.map(to_timestamp),
                    query.kind.map(|k| k.as_str()),
                ],
                WorkoutRow::from_row,
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut workouts = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            workouts.push(row.into_record()?);
        }

        Ok(workouts)
    }
}

const WORKOUT_COLUMNS: &str = "id, user_id, kind, performed_at, duration_seconds, rpe, notes, \
                               payload_json, created_at, updated_at";

/// Raw workout row, converted outside the rusqlite closure so parse errors
/// surface as `DatabaseError`.
struct WorkoutRow {
    id: String,
    user_id: String,
    kind: String,
    performed_at: String,
    duration_seconds: u32,
    rpe: Option<u8>,
    notes: Option<String>,
    payload_json: String,
    created_at: String,
    updated_at: String,
}

impl WorkoutRow {
    fn from_row(row: &rusqlite::Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            performed_at: row.get(3)?,
            duration_seconds: row.get(4)?,
            rpe: row.get(5)?,
            notes: row.get(6)?,
            payload_json: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<WorkoutRecord, DatabaseError> {
        let payload: WorkoutPayload = serde_json::from_str(&self.payload_json)
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?;

        if WorkoutKind::from_str(&self.kind) != Some(payload.kind()) {
            return Err(DatabaseError::DeserializationError(format!(
                "workout {} kind column '{}' disagrees with payload '{}'",
                self.id,
                self.kind,
                payload.kind()
            )));
        }

        Ok(WorkoutRecord {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            performed_at: parse_timestamp(&self.performed_at)?,
            duration_seconds: self.duration_seconds,
            rpe: self.rpe,
            notes: self.notes,
            payload,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn get_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    let result: SqliteResult<i32> = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    );

    match result {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
    }
}

fn migrate(conn: &Connection, from_version: i32) -> Result<(), DatabaseError> {
    if from_version < 1 {
        conn.execute_batch(SCHEMA)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
            [CURRENT_VERSION],
        )
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        tracing::info!("Database migrated to version {}", CURRENT_VERSION);
    }

    Ok(())
}

/// Fixed-width UTC timestamp, so lexical order in SQLite matches time order.
pub fn to_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("timestamp '{s}': {e}")))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::DeserializationError(format!("date '{s}': {e}")))
}

pub fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::DeserializationError(format!("uuid '{s}': {e}")))
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
