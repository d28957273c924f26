//! Personal records.
//!
//! Best-ever values per user and record kind, updated as workouts are logged.

pub mod detector;
pub mod types;

pub use detector::{candidates, exercise_slug, RecordDetector};
pub use types::{Direction, PersonalRecord, RecordCandidate, RecordCategory, RecordKind};
