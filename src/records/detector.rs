//! Personal record detection.
//!
//! Every committed workout is reduced to candidate values, one per record
//! kind it can affect. Each candidate is written with a single conditional
//! upsert that only replaces the stored value when the candidate is strictly
//! better, so concurrent detections can never install a worse record.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{Direction, PersonalRecord, RecordCandidate, RecordCategory, RecordKind};
use crate::storage::database::{parse_timestamp, parse_uuid, to_timestamp};
use crate::storage::{Database, DatabaseError, WriteOutcome};
use crate::workouts::{WorkoutPayload, WorkoutRecord};

/// Race distances with a pace record.
const RACE_DISTANCES: [(RecordKind, f64); 3] = [
    (RecordKind::Fastest5k, 5.0),
    (RecordKind::Fastest10k, 10.0),
    (RecordKind::FastestHalfMarathon, 21.0975),
];

const RECORD_COLUMNS: &str = "id, user_id, category, record_type, value, unit, achieved_at, \
                              previous_value, improvement_percent, source_workout_id, updated_at";

/// Normalize an exercise name into a record key suffix.
///
/// "Bench Press" and "bench-press" both become `bench_press`.
pub fn exercise_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Candidate record values for a workout, at most one per kind.
pub fn candidates(workout: &WorkoutRecord, race_tolerance_percent: f64) -> Vec<RecordCandidate> {
    let mut best: HashMap<RecordKind, f64> = HashMap::new();
    let mut offer = |kind: RecordKind, value: f64| {
        if !value.is_finite() || value <= 0.0 {
            return;
        }
        let direction = kind.direction();
        best.entry(kind)
            .and_modify(|current| {
                if direction.is_better(value, *current) {
                    *current = value;
                }
            })
            .or_insert(value);
    };

    match &workout.payload {
        WorkoutPayload::Run(run) => {
            offer(RecordKind::LongestRun, run.distance_km);

            if let Some(pace) = workout.run_pace_sec_per_km() {
                for (kind, race_km) in RACE_DISTANCES.iter() {
                    let deviation = (run.distance_km - race_km).abs() / race_km * 100.0;
                    if deviation <= race_tolerance_percent {
                        offer(kind.clone(), pace);
                    }
                }
            }
        }
        WorkoutPayload::Lift(lift) => {
            for exercise in &lift.exercises {
                let slug = exercise_slug(&exercise.name);
                if !slug.is_empty() {
                    offer(RecordKind::Heaviest(slug), exercise.weight_kg);
                }
            }
        }
        WorkoutPayload::Cardio(_) => {
            offer(RecordKind::LongestCardio, f64::from(workout.duration_seconds) / 60.0);
        }
        WorkoutPayload::Biometrics(_) => {}
    }

    let mut candidates: Vec<RecordCandidate> = best
        .into_iter()
        .map(|(kind, value)| RecordCandidate { kind, value })
        .collect();
    candidates.sort_by_key(|c| c.kind.key());
    candidates
}

/// Detects and stores personal records.
pub struct RecordDetector {
    db: Arc<Database>,
    race_tolerance_percent: f64,
}

impl RecordDetector {
    pub fn new(db: Arc<Database>, race_tolerance_percent: f64) -> Self {
        Self {
            db,
            race_tolerance_percent,
        }
    }

    /// Check a committed workout against the stored records.
    ///
    /// Returns the records this workout set or improved; an empty list means
    /// nothing changed.
    pub fn detect(&self, workout: &WorkoutRecord) -> Result<Vec<PersonalRecord>, DatabaseError> {
        let candidates = candidates(workout, self.race_tolerance_percent);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let conn = self.db.connection();
        let mut updated = Vec::new();

        for candidate in candidates {
            match upsert_if_better(&conn, workout, &candidate, now)? {
                WriteOutcome::Applied => {
                    if let Some(record) = load_record(&conn, workout.user_id, &candidate.kind)? {
                        tracing::info!(
                            user_id = %workout.user_id,
                            record = %record.record_type,
                            value = record.value,
                            previous = ?record.previous_value,
                            "New personal record"
                        );
                        updated.push(record);
                    }
                }
                WriteOutcome::AlreadyHandled => {
                    tracing::debug!(
                        user_id = %workout.user_id,
                        record = %candidate.kind,
                        value = candidate.value,
                        "Candidate does not beat stored record"
                    );
                }
            }
        }

        Ok(updated)
    }

    /// Get a user's record of one kind.
    pub fn get(&self, user_id: Uuid, kind: &RecordKind) -> Result<Option<PersonalRecord>, DatabaseError> {
        load_record(&self.db.connection(), user_id, kind)
    }

    /// List all records held by a user.
    pub fn list(&self, user_id: Uuid) -> Result<Vec<PersonalRecord>, DatabaseError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM personal_records
                 WHERE user_id = ?1 ORDER BY category, record_type"
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], RecordRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            records.push(row.into_record()?);
        }
        Ok(records)
    }

    /// Number of records a user holds.
    pub fn count(&self, user_id: Uuid) -> Result<u32, DatabaseError> {
        count_records(&self.db.connection(), user_id)
    }
}

/// Number of records held by a user on an already locked connection.
pub(crate) fn count_records(conn: &Connection, user_id: Uuid) -> Result<u32, DatabaseError> {
    conn.query_row(
        "SELECT COUNT(*) FROM personal_records WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| row.get(0),
    )
    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
}

/// Insert the record, or replace the stored value if the candidate is
/// strictly better. The comparison happens inside SQLite.
fn upsert_if_better(
    conn: &Connection,
    workout: &WorkoutRecord,
    candidate: &RecordCandidate,
    now: DateTime<Utc>,
) -> Result<WriteOutcome, DatabaseError> {
    let kind = &candidate.kind;
    let improvement = match kind.direction() {
        Direction::Min => "(personal_records.value - excluded.value)",
        Direction::Max => "(excluded.value - personal_records.value)",
    };

    let sql = format!(
        "INSERT INTO personal_records
         (id, user_id, category, record_type, value, unit, achieved_at,
          previous_value, improvement_percent, source_workout_id, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, NULL, ?8, ?9)
         ON CONFLICT(user_id, record_type) DO UPDATE SET
             previous_value = personal_records.value,
             improvement_percent = CASE
                 WHEN personal_records.value = 0 THEN NULL
                 ELSE {improvement} / personal_records.value * 100.0
             END,
             value = excluded.value,
             achieved_at = excluded.achieved_at,
             source_workout_id = excluded.source_workout_id,
             updated_at = excluded.updated_at
         WHERE excluded.value {op} personal_records.value",
        op = kind.direction().sql_operator(),
    );

    let changes = conn
        .execute(
            &sql,
            params![
                Uuid::new_v4().to_string(),
                workout.user_id.to_string(),
                kind.category().as_str(),
                kind.key(),
                candidate.value,
                kind.unit(),
                to_timestamp(workout.performed_at),
                workout.id.to_string(),
                to_timestamp(now),
            ],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    Ok(WriteOutcome::from_changes(changes))
}

fn load_record(
    conn: &Connection,
    user_id: Uuid,
    kind: &RecordKind,
) -> Result<Option<PersonalRecord>, DatabaseError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM personal_records
                 WHERE user_id = ?1 AND record_type = ?2"
            ),
            params![user_id.to_string(), kind.key()],
            RecordRow::from_row,
        )
        .optional()
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    row.map(RecordRow::into_record).transpose()
}

struct RecordRow {
    id: String,
    user_id: String,
    category: String,
    record_type: String,
    value: f64,
    unit: String,
    achieved_at: String,
    previous_value: Option<f64>,
    improvement_percent: Option<f64>,
    source_workout_id: Option<String>,
    updated_at: String,
}

impl RecordRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category: row.get(2)?,
            record_type: row.get(3)?,
            value: row.get(4)?,
            unit: row.get(5)?,
            achieved_at: row.get(6)?,
            previous_value: row.get(7)?,
            improvement_percent: row.get(8)?,
            source_workout_id: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_record(self) -> Result<PersonalRecord, DatabaseError> {
        let category = RecordCategory::from_str(&self.category).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("record category '{}'", self.category))
        })?;
        let record_type = RecordKind::parse(&self.record_type).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("record type '{}'", self.record_type))
        })?;

        Ok(PersonalRecord {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            category,
            record_type,
            value: self.value,
            unit: self.unit,
            achieved_at: parse_timestamp(&self.achieved_at)?,
            previous_value: self.previous_value,
            improvement_percent: self.improvement_percent,
            source_workout_id: self.source_workout_id.as_deref().map(parse_uuid).transpose()?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}
