//! Leaderboards module
//!
//! Deterministic rankings of users by workout metrics.

pub mod rankings;

// Re-export commonly used types
pub use rankings::{
    rank_standings, Leaderboard, LeaderboardEntry, LeaderboardError, LeaderboardMetric,
    LeaderboardScope, LeaderboardService, Standing,
};
