//! Badge type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Badge category for achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    /// Workout count and training time milestones
    Milestone,
    /// Total and single-run distance milestones
    Distance,
    /// Streak and weekly-frequency achievements
    Consistency,
    /// Lifting achievements
    Strength,
    /// Personal record achievements
    Records,
}

impl BadgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeCategory::Milestone => "milestone",
            BadgeCategory::Distance => "distance",
            BadgeCategory::Consistency => "consistency",
            BadgeCategory::Strength => "strength",
            BadgeCategory::Records => "records",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "milestone" => Some(BadgeCategory::Milestone),
            "distance" => Some(BadgeCategory::Distance),
            "consistency" => Some(BadgeCategory::Consistency),
            "strength" => Some(BadgeCategory::Strength),
            "records" => Some(BadgeCategory::Records),
            _ => None,
        }
    }
}

/// How hard a badge is to earn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl BadgeRarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeRarity::Common => "common",
            BadgeRarity::Uncommon => "uncommon",
            BadgeRarity::Rare => "rare",
            BadgeRarity::Epic => "epic",
            BadgeRarity::Legendary => "legendary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "common" => Some(BadgeRarity::Common),
            "uncommon" => Some(BadgeRarity::Uncommon),
            "rare" => Some(BadgeRarity::Rare),
            "epic" => Some(BadgeRarity::Epic),
            "legendary" => Some(BadgeRarity::Legendary),
            _ => None,
        }
    }
}

/// Badge definition as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub version: u32,
}

/// Badge awarded to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnedBadge {
    pub user_id: Uuid,
    pub badge: BadgeDefinition,
    pub earned_at: DateTime<Utc>,
}

/// Badge with the requesting user's earned state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeStatus {
    pub badge: BadgeDefinition,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
}

/// User stats badge conditions are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BadgeStats {
    pub total_workouts: u32,
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
    pub runs: u32,
    pub lifts: u32,
    pub longest_run_km: f64,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub personal_records: u32,
    /// Workouts in the current calendar week
    pub workouts_this_week: u32,
}
