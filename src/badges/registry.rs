//! Compiled badge rule registry.
//!
//! Every badge is a fixed entry mapping its id to a pure condition over
//! [`BadgeStats`]. The table is built once per process and never mutated;
//! changing a rule means bumping its version.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::types::{BadgeCategory, BadgeRarity, BadgeStats};

/// Condition a user's stats must meet.
pub type BadgeCondition = fn(&BadgeStats) -> bool;

/// One compiled badge rule.
#[derive(Clone, Copy)]
pub struct BadgeRule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub version: u32,
    pub condition: BadgeCondition,
}

impl BadgeRule {
    pub fn is_met(&self, stats: &BadgeStats) -> bool {
        (self.condition)(stats)
    }
}

impl std::fmt::Debug for BadgeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeRule")
            .field("id", &self.id)
            .field("version", &self.version)
            .finish()
    }
}

const RULES: &[BadgeRule] = &[
    BadgeRule {
        id: "first_workout",
        name: "First Steps",
        description: "Log your first workout",
        category: BadgeCategory::Milestone,
        rarity: BadgeRarity::Common,
        version: 1,
        condition: |s| s.total_workouts >= 1,
    },
    BadgeRule {
        id: "ten_workouts",
        name: "Getting Serious",
        description: "Log 10 workouts",
        category: BadgeCategory::Milestone,
        rarity: BadgeRarity::Common,
        version: 1,
        condition: |s| s.total_workouts >= 10,
    },
    BadgeRule {
        id: "fifty_workouts",
        name: "Half Century",
        description: "Log 50 workouts",
        category: BadgeCategory::Milestone,
        rarity: BadgeRarity::Uncommon,
        version: 1,
        condition: |s| s.total_workouts >= 50,
    },
    BadgeRule {
        id: "hundred_workouts",
        name: "Centurion",
        description: "Log 100 workouts",
        category: BadgeCategory::Milestone,
        rarity: BadgeRarity::Rare,
        version: 1,
        condition: |s| s.total_workouts >= 100,
    },
    BadgeRule {
        id: "ten_hours",
        name: "Time Invested",
        description: "Train for 10 hours in total",
        category: BadgeCategory::Milestone,
        rarity: BadgeRarity::Uncommon,
        version: 1,
        condition: |s| s.total_duration_minutes >= 600.0,
    },
    BadgeRule {
        id: "distance_50",
        name: "Fifty K",
        description: "Cover 50 km in total",
        category: BadgeCategory::Distance,
        rarity: BadgeRarity::Common,
        version: 1,
        condition: |s| s.total_distance_km >= 50.0,
    },
    BadgeRule {
        id: "distance_100",
        name: "Century",
        description: "Cover 100 km in total",
        category: BadgeCategory::Distance,
        rarity: BadgeRarity::Uncommon,
        version: 1,
        condition: |s| s.total_distance_km >= 100.0,
    },
    BadgeRule {
        id: "distance_1000",
        name: "Thousand Club",
        description: "Cover 1000 km in total",
        category: BadgeCategory::Distance,
        rarity: BadgeRarity::Epic,
        version: 1,
        condition: |s| s.total_distance_km >= 1000.0,
    },
    BadgeRule {
        id: "half_marathon_distance",
        name: "Half Way There",
        description: "Finish a single run of half marathon distance",
        category: BadgeCategory::Distance,
        rarity: BadgeRarity::Rare,
        version: 1,
        condition: |s| s.longest_run_km >= 21.0975,
    },
    BadgeRule {
        id: "marathon_distance",
        name: "Marathoner",
        description: "Finish a single run of marathon distance",
        category: BadgeCategory::Distance,
        rarity: BadgeRarity::Epic,
        version: 1,
        condition: |s| s.longest_run_km >= 42.195,
    },
    BadgeRule {
        id: "streak_7",
        name: "Week Warrior",
        description: "Train 7 days in a row",
        category: BadgeCategory::Consistency,
        rarity: BadgeRarity::Uncommon,
        version: 1,
        condition: |s| s.longest_streak_days >= 7,
    },
    BadgeRule {
        id: "streak_30",
        name: "Month Master",
        description: "Train 30 days in a row",
        category: BadgeCategory::Consistency,
        rarity: BadgeRarity::Epic,
        version: 1,
        condition: |s| s.longest_streak_days >= 30,
    },
    BadgeRule {
        id: "streak_100",
        name: "Unstoppable",
        description: "Train 100 days in a row",
        category: BadgeCategory::Consistency,
        rarity: BadgeRarity::Legendary,
        version: 1,
        condition: |s| s.longest_streak_days >= 100,
    },
    BadgeRule {
        id: "busy_week",
        name: "Busy Week",
        description: "Log 5 workouts in one calendar week",
        category: BadgeCategory::Consistency,
        rarity: BadgeRarity::Uncommon,
        version: 1,
        condition: |s| s.workouts_this_week >= 5,
    },
    BadgeRule {
        id: "first_lift",
        name: "Iron Initiate",
        description: "Log your first lifting session",
        category: BadgeCategory::Strength,
        rarity: BadgeRarity::Common,
        version: 1,
        condition: |s| s.lifts >= 1,
    },
    BadgeRule {
        id: "iron_regular",
        name: "Iron Regular",
        description: "Log 25 lifting sessions",
        category: BadgeCategory::Strength,
        rarity: BadgeRarity::Rare,
        version: 1,
        condition: |s| s.lifts >= 25,
    },
    BadgeRule {
        id: "record_breaker",
        name: "Record Breaker",
        description: "Set your first personal record",
        category: BadgeCategory::Records,
        rarity: BadgeRarity::Common,
        version: 1,
        condition: |s| s.personal_records >= 1,
    },
    BadgeRule {
        id: "record_collector",
        name: "Record Collector",
        description: "Hold 10 personal records at once",
        category: BadgeCategory::Records,
        rarity: BadgeRarity::Rare,
        version: 1,
        condition: |s| s.personal_records >= 10,
    },
];

/// Lookup from badge id to rule.
pub struct BadgeRegistry {
    rules: HashMap<&'static str, BadgeRule>,
}

impl BadgeRegistry {
    fn compiled() -> Self {
        Self {
            rules: RULES.iter().map(|rule| (rule.id, *rule)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&BadgeRule> {
        self.rules.get(id)
    }

    /// All rules in registration order.
    pub fn rules(&self) -> impl Iterator<Item = &BadgeRule> {
        RULES.iter().filter_map(|rule| self.rules.get(rule.id))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Process-wide badge registry.
pub fn registry() -> &'static BadgeRegistry {
    static REGISTRY: OnceLock<BadgeRegistry> = OnceLock::new();
    REGISTRY.get_or_init(BadgeRegistry::compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<&str> = RULES.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), RULES.len());
        assert_eq!(registry().len(), RULES.len());
    }

    #[test]
    fn test_empty_stats_earn_nothing() {
        let stats = BadgeStats::default();
        assert!(registry().rules().all(|rule| !rule.is_met(&stats)));
    }

    #[test]
    fn test_conditions_in_isolation() {
        let stats = BadgeStats {
            total_workouts: 12,
            longest_run_km: 21.1,
            longest_streak_days: 7,
            ..Default::default()
        };

        let met: Vec<&str> = registry()
            .rules()
            .filter(|rule| rule.is_met(&stats))
            .map(|rule| rule.id)
            .collect();
        assert_eq!(
            met,
            vec!["first_workout", "ten_workouts", "half_marathon_distance", "streak_7"]
        );
    }
}
