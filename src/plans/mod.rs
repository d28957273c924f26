//! Training plans.
//!
//! Periodized plan generation from a fixed template table, plus completion
//! tracking against a generated plan.

pub mod generator;
pub mod manager;
pub mod templates;
pub mod tracker;
pub mod types;

pub use generator::{PhasePlan, PlanGenerator};
pub use manager::{PlanError, PlanManager};
pub use templates::{template_table, DaySlot, PlanTemplate, VolumeUnit};
pub use types::{
    Difficulty, Intensity, Phase, PlanStatus, PlanType, PlanWeek, PlanWorkout, SessionKind,
    TrainingPlan,
};
