//! Badge eligibility and awarding.
//!
//! Definitions are seeded from the compiled registry into
//! `badge_definitions`. A sync pass evaluates every definition the user has
//! not earned yet and awards the ones whose condition holds. Awards are
//! `INSERT OR IGNORE` against `UNIQUE(user_id, badge_id)`, so two concurrent
//! passes for the same user award each badge once.

use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::params;
use std::sync::Arc;
use uuid::Uuid;

use super::registry::registry;
use super::types::{BadgeCategory, BadgeDefinition, BadgeRarity, BadgeStats, BadgeStatus, EarnedBadge};
use crate::records::detector::count_records;
use crate::storage::database::{parse_timestamp, to_timestamp};
use crate::storage::{Database, DatabaseError, WriteOutcome};
use crate::workouts::{AggregateError, TimeRange, Window, WorkoutAggregator, WorkoutKind};

/// Badge manager.
pub struct BadgeManager {
    db: Arc<Database>,
    offset: FixedOffset,
}

impl BadgeManager {
    /// Create a new badge manager.
    pub fn new(db: Arc<Database>, offset: FixedOffset) -> Self {
        Self { db, offset }
    }

    /// Seed the registry into the database.
    ///
    /// Existing rows are only overwritten by a newer rule version.
    pub fn initialize_badges(&self) -> Result<(), BadgeError> {
        let conn = self.db.connection();

        for rule in registry().rules() {
            conn.execute(
                "INSERT INTO badge_definitions (id, name, description, category, rarity, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     description = excluded.description,
                     category = excluded.category,
                     rarity = excluded.rarity,
                     version = excluded.version
                 WHERE excluded.version > badge_definitions.version",
                params![
                    rule.id,
                    rule.name,
                    rule.description,
                    rule.category.as_str(),
                    rule.rarity.as_str(),
                    rule.version,
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        }

        tracing::debug!(count = registry().len(), "Badge definitions seeded");
        Ok(())
    }

    /// Gather the stats badge conditions look at.
    pub fn collect_stats(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<BadgeStats, BadgeError> {
        let aggregator = WorkoutAggregator::new(self.db.as_ref(), self.offset);

        let lifetime = aggregator.aggregate(user_id, &Window::AllTime, None)?;
        let this_week =
            aggregator.aggregate(user_id, &TimeRange::ThisWeek.window(now, self.offset), None)?;
        let current_streak_days = aggregator.current_streak(user_id, now)?;
        let longest_streak_days = aggregator.longest_streak(user_id)?;
        let personal_records = count_records(&self.db.connection(), user_id)?;

        Ok(BadgeStats {
            total_workouts: lifetime.count,
            total_distance_km: lifetime.total_distance_km,
            total_duration_minutes: lifetime.total_duration_minutes(),
            runs: lifetime.count_of(WorkoutKind::Run),
            lifts: lifetime.count_of(WorkoutKind::Lift),
            longest_run_km: lifetime.longest_run_km,
            current_streak_days,
            longest_streak_days,
            personal_records,
            workouts_this_week: this_week.count,
        })
    }

    /// Award every badge the user now qualifies for.
    ///
    /// Returns only badges awarded by this call; re-running without new
    /// activity returns an empty list.
    pub fn sync(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<EarnedBadge>, BadgeError> {
        let stats = self.collect_stats(user_id, now)?;
        self.sync_with_stats(user_id, &stats, now)
    }

    /// Award badges against precomputed stats.
    pub fn sync_with_stats(
        &self,
        user_id: Uuid,
        stats: &BadgeStats,
        now: DateTime<Utc>,
    ) -> Result<Vec<EarnedBadge>, BadgeError> {
        let mut newly_earned = Vec::new();

        for row in self.unearned_definitions(user_id)? {
            let Some(badge) = row.validate() else {
                continue;
            };

            let Some(rule) = registry().get(&badge.id) else {
                tracing::warn!(badge_id = %badge.id, "Skipping badge with no registered rule");
                continue;
            };

            if !rule.is_met(stats) {
                continue;
            }

            match self.award(user_id, &badge.id, now)? {
                WriteOutcome::Applied => {
                    tracing::info!(user_id = %user_id, badge_id = %badge.id, "Badge awarded");
                    newly_earned.push(EarnedBadge {
                        user_id,
                        badge,
                        earned_at: now,
                    });
                }
                WriteOutcome::AlreadyHandled => {
                    tracing::debug!(
                        user_id = %user_id,
                        badge_id = %badge.id,
                        "Badge already awarded by a concurrent sync"
                    );
                }
            }
        }

        Ok(newly_earned)
    }

    /// Every valid badge definition with the user's earned state.
    pub fn list_badges(&self, user_id: Uuid) -> Result<Vec<BadgeStatus>, BadgeError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT d.id, d.name, d.description, d.category, d.rarity, d.version, a.earned_at
                 FROM badge_definitions d
                 LEFT JOIN badge_awards a ON a.badge_id = d.id AND a.user_id = ?1
                 ORDER BY d.category, d.id",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok((DefinitionRow::from_row(row)?, row.get::<_, Option<String>>(6)?))
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut badges = Vec::new();
        for row in rows {
            let (definition, earned_at) = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            let Some(badge) = definition.validate() else {
                continue;
            };
            let earned_at = earned_at.as_deref().map(parse_timestamp).transpose()?;

            badges.push(BadgeStatus {
                badge,
                earned: earned_at.is_some(),
                earned_at,
            });
        }

        Ok(badges)
    }

    /// Badges the user has earned, most recent first.
    pub fn get_earned_badges(&self, user_id: Uuid) -> Result<Vec<EarnedBadge>, BadgeError> {
        let mut earned: Vec<EarnedBadge> = self
            .list_badges(user_id)?
            .into_iter()
            .filter_map(|status| {
                status.earned_at.map(|earned_at| EarnedBadge {
                    user_id,
                    badge: status.badge,
                    earned_at,
                })
            })
            .collect();
        earned.sort_by(|a, b| b.earned_at.cmp(&a.earned_at).then_with(|| a.badge.id.cmp(&b.badge.id)));
        Ok(earned)
    }

    fn unearned_definitions(&self, user_id: Uuid) -> Result<Vec<DefinitionRow>, BadgeError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT d.id, d.name, d.description, d.category, d.rarity, d.version
                 FROM badge_definitions d
                 WHERE NOT EXISTS (
                     SELECT 1 FROM badge_awards a WHERE a.badge_id = d.id AND a.user_id = ?1
                 )
                 ORDER BY d.id",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], DefinitionRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut definitions = Vec::new();
        for row in rows {
            definitions.push(row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?);
        }
        Ok(definitions)
    }

    fn award(&self, user_id: Uuid, badge_id: &str, now: DateTime<Utc>) -> Result<WriteOutcome, BadgeError> {
        let changes = self
            .db
            .connection()
            .execute(
                "INSERT OR IGNORE INTO badge_awards (id, user_id, badge_id, earned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    badge_id,
                    to_timestamp(now),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(WriteOutcome::from_changes(changes))
    }
}

/// Raw `badge_definitions` row.
struct DefinitionRow {
    id: String,
    name: String,
    description: String,
    category: String,
    rarity: String,
    version: u32,
}

impl DefinitionRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            rarity: row.get(4)?,
            version: row.get(5)?,
        })
    }

    /// Parse into a definition, logging and dropping malformed rows.
    fn validate(self) -> Option<BadgeDefinition> {
        let Some(category) = BadgeCategory::from_str(&self.category) else {
            tracing::warn!(badge_id = %self.id, category = %self.category, "Skipping badge with unknown category");
            return None;
        };
        let Some(rarity) = BadgeRarity::from_str(&self.rarity) else {
            tracing::warn!(badge_id = %self.id, rarity = %self.rarity, "Skipping badge with unknown rarity");
            return None;
        };

        Some(BadgeDefinition {
            id: self.id,
            name: self.name,
            description: self.description,
            category,
            rarity,
            version: self.version,
        })
    }
}

/// Badge errors.
#[derive(Debug, thiserror::Error)]
pub enum BadgeError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),
}
