//! Badge eligibility.
//!
//! A closed, versioned set of badge rules evaluated against a user's
//! aggregates, with idempotent awarding.

pub mod manager;
pub mod registry;
pub mod types;

pub use manager::{BadgeError, BadgeManager};
pub use registry::{registry, BadgeCondition, BadgeRegistry, BadgeRule};
pub use types::{BadgeCategory, BadgeDefinition, BadgeRarity, BadgeStats, BadgeStatus, EarnedBadge};
