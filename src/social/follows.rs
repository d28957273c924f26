//! Follow graph.
//!
//! Directed "follows" edges between users. The friends leaderboard ranks a
//! user against the people they follow.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::database::{parse_uuid, to_timestamp};
use crate::storage::{Database, DatabaseError, WriteOutcome};

/// Follow graph backed by the `follows` table.
pub struct FollowGraph {
    db: Arc<Database>,
}

impl FollowGraph {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Follow a user. Following someone twice is a no-op.
    pub fn follow(
        &self,
        follower: Uuid,
        followee: Uuid,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome, FollowError> {
        if follower == followee {
            return Err(FollowError::SelfFollow(follower));
        }

        let changes = self
            .db
            .connection()
            .execute(
                "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![follower.to_string(), followee.to_string(), to_timestamp(now)],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(WriteOutcome::from_changes(changes))
    }

    /// Stop following a user. Returns whether an edge was removed.
    pub fn unfollow(&self, follower: Uuid, followee: Uuid) -> Result<bool, FollowError> {
        let changes = self
            .db
            .connection()
            .execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                params![follower.to_string(), followee.to_string()],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(changes > 0)
    }

    /// Users `user_id` follows.
    pub fn followees(&self, user_id: Uuid) -> Result<Vec<Uuid>, FollowError> {
        Ok(followees_of(&self.db.connection(), user_id)?)
    }
}

/// Followees of a user on an already locked connection.
pub(crate) fn followees_of(conn: &Connection, user_id: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
    let mut stmt = conn
        .prepare("SELECT followee_id FROM follows WHERE follower_id = ?1 ORDER BY followee_id")
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    let rows = stmt
        .query_map(params![user_id.to_string()], |row| row.get::<_, String>(0))
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    let mut ids = Vec::new();
    for row in rows {
        let id = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        ids.push(parse_uuid(&id)?);
    }
    Ok(ids)
}

/// Follow graph errors.
#[derive(Debug, thiserror::Error)]
pub enum FollowError {
    #[error("User {0} cannot follow themselves")]
    SelfFollow(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_is_idempotent() {
        let graph = FollowGraph::new(Arc::new(Database::open_in_memory().unwrap()));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let now = Utc::now();

        assert_eq!(graph.follow(a, b, now).unwrap(), WriteOutcome::Applied);
        assert_eq!(graph.follow(a, b, now).unwrap(), WriteOutcome::AlreadyHandled);
        assert_eq!(graph.followees(a).unwrap(), vec![b]);
        assert!(graph.followees(b).unwrap().is_empty());
    }

    #[test]
    fn test_unfollow() {
        let graph = FollowGraph::new(Arc::new(Database::open_in_memory().unwrap()));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        graph.follow(a, b, Utc::now()).unwrap();
        assert!(graph.unfollow(a, b).unwrap());
        assert!(!graph.unfollow(a, b).unwrap());
        assert!(graph.followees(a).unwrap().is_empty());
    }

    #[test]
    fn test_self_follow_rejected() {
        let graph = FollowGraph::new(Arc::new(Database::open_in_memory().unwrap()));
        let a = Uuid::new_v4();
        assert!(matches!(graph.follow(a, a, Utc::now()), Err(FollowError::SelfFollow(_))));
    }
}
