//! Leaderboard rankings service.
//!
//! Ranks users by a workout metric over a window. Ranking itself is a pure
//! function of the (user, value, reached-at) snapshot so it can be repeated
//! and tested without storage.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use crate::social::follows::followees_of;
use crate::storage::{Database, DatabaseError};
use crate::workouts::{AggregateError, Window, WorkoutAggregates, WorkoutAggregator};

/// Who is ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    /// The requester and everyone they follow
    Friends,
    /// Everyone with training activity in the window
    Global,
}

impl LeaderboardScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardScope::Friends => "friends",
            LeaderboardScope::Global => "global",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "friends" => Some(LeaderboardScope::Friends),
            "global" => Some(LeaderboardScope::Global),
            _ => None,
        }
    }
}

/// What is ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    /// Number of workouts
    Workouts,
    /// Total distance in km
    Distance,
    /// Total training time in minutes
    Duration,
}

impl LeaderboardMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardMetric::Workouts => "workouts",
            LeaderboardMetric::Distance => "distance",
            LeaderboardMetric::Duration => "duration",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "workouts" => Some(LeaderboardMetric::Workouts),
            "distance" => Some(LeaderboardMetric::Distance),
            "duration" => Some(LeaderboardMetric::Duration),
            _ => None,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            LeaderboardMetric::Workouts => "workouts",
            LeaderboardMetric::Distance => "km",
            LeaderboardMetric::Duration => "minutes",
        }
    }

    /// Read this metric off a set of aggregates.
    pub fn value(&self, aggregates: &WorkoutAggregates) -> f64 {
        match self {
            LeaderboardMetric::Workouts => f64::from(aggregates.count),
            LeaderboardMetric::Distance => aggregates.total_distance_km,
            LeaderboardMetric::Duration => aggregates.total_duration_minutes(),
        }
    }
}

/// One user's metric total before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub user_id: Uuid,
    pub value: f64,
    /// When the total reached its current value
    pub reached_at: Option<DateTime<Utc>>,
}

/// Leaderboard entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub value: f64,
    pub reached_at: Option<DateTime<Utc>>,
    pub is_current_user: bool,
}

/// Ranked leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub scope: LeaderboardScope,
    pub metric: LeaderboardMetric,
    pub unit: &'static str,
    pub entries: Vec<LeaderboardEntry>,
    /// Number of ranked users before truncation
    pub total_participants: u32,
    /// The requester's own entry, present even when outside `entries`
    pub current_user_entry: Option<LeaderboardEntry>,
}

fn compare_standings(a: &Standing, b: &Standing) -> Ordering {
    b.value
        .total_cmp(&a.value)
        .then_with(|| match (a.reached_at, b.reached_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Rank standings.
///
/// Highest value first. Equal values are ordered by who reached the value
/// first, then by user id, so every user gets a distinct rank. Users with no
/// activity (zero value) are left out.
pub fn rank_standings(mut standings: Vec<Standing>, current_user: Uuid) -> Vec<LeaderboardEntry> {
    standings.retain(|s| s.value.is_finite() && s.value > 0.0);
    standings.sort_by(compare_standings);

    standings
        .into_iter()
        .enumerate()
        .map(|(i, s)| LeaderboardEntry {
            rank: i as u32 + 1,
            user_id: s.user_id,
            value: s.value,
            reached_at: s.reached_at,
            is_current_user: s.user_id == current_user,
        })
        .collect()
}

/// Build a leaderboard from ranked entries, keeping at most `limit` rows.
pub fn into_leaderboard(
    scope: LeaderboardScope,
    metric: LeaderboardMetric,
    ranked: Vec<LeaderboardEntry>,
    limit: usize,
) -> Leaderboard {
    let total_participants = ranked.len() as u32;
    let current_user_entry = ranked.iter().find(|e| e.is_current_user).cloned();
    let entries = ranked.into_iter().take(limit.max(1)).collect();

    Leaderboard {
        scope,
        metric,
        unit: metric.unit(),
        entries,
        total_participants,
        current_user_entry,
    }
}

/// Leaderboard service.
pub struct LeaderboardService {
    db: Arc<Database>,
    offset: FixedOffset,
    limit: usize,
}

impl LeaderboardService {
    /// Create a new leaderboard service.
    pub fn new(db: Arc<Database>, offset: FixedOffset, limit: usize) -> Self {
        Self { db, offset, limit }
    }

    /// Users ranked under a scope.
    fn candidates(
        &self,
        scope: LeaderboardScope,
        window: &Window,
        requester: Uuid,
    ) -> Result<Vec<Uuid>, LeaderboardError> {
        match scope {
            LeaderboardScope::Friends => {
                let mut users = followees_of(&self.db.connection(), requester)?;
                users.push(requester);
                users.sort();
                users.dedup();
                Ok(users)
            }
            LeaderboardScope::Global => {
                let bounds = window.bounds(self.offset)?;
                Ok(self.db.users_with_training(bounds)?)
            }
        }
    }

    /// Metric totals for every candidate.
    pub fn standings(
        &self,
        scope: LeaderboardScope,
        metric: LeaderboardMetric,
        window: &Window,
        requester: Uuid,
    ) -> Result<Vec<Standing>, LeaderboardError> {
        let aggregator = WorkoutAggregator::new(self.db.as_ref(), self.offset);
        let bounds = window.bounds(self.offset)?;

        let mut standings = Vec::new();
        for user_id in self.candidates(scope, window, requester)? {
            let aggregates = aggregator.aggregate_bounds(user_id, bounds, None)?;
            standings.push(Standing {
                user_id,
                value: metric.value(&aggregates),
                reached_at: aggregates.last_workout_at,
            });
        }
        Ok(standings)
    }

    /// Get a ranked leaderboard.
    pub fn get_leaderboard(
        &self,
        scope: LeaderboardScope,
        metric: LeaderboardMetric,
        window: &Window,
        requester: Uuid,
    ) -> Result<Leaderboard, LeaderboardError> {
        let standings = self.standings(scope, metric, window, requester)?;
        let ranked = rank_standings(standings, requester);

        tracing::debug!(
            scope = scope.as_str(),
            metric = metric.as_str(),
            ranked = ranked.len(),
            "Leaderboard ranked"
        );

        Ok(into_leaderboard(scope, metric, ranked, self.limit))
    }
}

/// Leaderboard errors.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),
}
