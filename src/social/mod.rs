//! Social features module
//!
//! Provides the follow graph and group challenges.

pub mod challenges;
pub mod follows;
pub mod types;

// Re-export commonly used types
pub use challenges::{ChallengeError, ChallengeManager};
pub use follows::{FollowError, FollowGraph};
pub use types::{Challenge, ChallengeParticipant, NewChallenge};
