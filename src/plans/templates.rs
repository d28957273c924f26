//! Periodization templates.
//!
//! One template per offered (plan type, difficulty) pair. The table is built
//! once per process and read-only afterwards. Combinations with no entry are
//! not offered.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::types::{Difficulty, PlanType, SessionKind};

/// Unit a template measures weekly volume in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeUnit {
    Kilometers,
    Minutes,
}

/// Session on one weekday with its share of the weekly volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySlot {
    pub session: SessionKind,
    pub share: f64,
}

const fn slot(session: SessionKind, share: f64) -> DaySlot {
    DaySlot { session, share }
}

const REST: DaySlot = slot(SessionKind::Rest, 0.0);

/// Monday-first weekly pattern.
pub type WeekPattern = [DaySlot; 7];

/// Periodization template.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanTemplate {
    pub plan_type: PlanType,
    pub difficulty: Difficulty,
    pub min_weeks: u32,
    pub max_weeks: u32,
    pub unit: VolumeUnit,
    /// Weekly volume of the first week
    pub start_volume: f64,
    /// Weekly volume of the last week before the taper
    pub peak_volume: f64,
    /// Volume multiplier applied per taper week
    pub taper_factor: f64,
    /// Minutes per km used to turn distance into duration
    pub pace_min_per_km: f64,
    pub pattern: WeekPattern,
}

impl PlanTemplate {
    /// Number of training (non-rest) days per week.
    pub fn training_days(&self) -> usize {
        self.pattern.iter().filter(|s| !s.session.is_rest()).count()
    }
}

const BEGINNER_RUNNING: WeekPattern = [
    REST,
    slot(SessionKind::Easy, 0.3),
    REST,
    slot(SessionKind::Tempo, 0.3),
    REST,
    slot(SessionKind::Long, 0.4),
    REST,
];

const INTERMEDIATE_RUNNING: WeekPattern = [
    REST,
    slot(SessionKind::Intervals, 0.2),
    slot(SessionKind::Easy, 0.2),
    slot(SessionKind::Tempo, 0.2),
    REST,
    slot(SessionKind::Long, 0.3),
    slot(SessionKind::Recovery, 0.1),
];

const ADVANCED_RUNNING: WeekPattern = [
    slot(SessionKind::Recovery, 0.1),
    slot(SessionKind::Intervals, 0.15),
    slot(SessionKind::Easy, 0.15),
    slot(SessionKind::Tempo, 0.15),
    REST,
    slot(SessionKind::Long, 0.3),
    slot(SessionKind::Easy, 0.15),
];

const BEGINNER_STRENGTH: WeekPattern = [
    slot(SessionKind::Strength, 0.34),
    REST,
    slot(SessionKind::Strength, 0.33),
    REST,
    slot(SessionKind::Strength, 0.33),
    REST,
    REST,
];

const INTERMEDIATE_STRENGTH: WeekPattern = [
    slot(SessionKind::Strength, 0.25),
    slot(SessionKind::Strength, 0.25),
    REST,
    slot(SessionKind::Strength, 0.25),
    slot(SessionKind::CrossTrain, 0.25),
    REST,
    REST,
];

const ADVANCED_STRENGTH: WeekPattern = [
    slot(SessionKind::Strength, 0.2),
    slot(SessionKind::Strength, 0.2),
    slot(SessionKind::CrossTrain, 0.1),
    slot(SessionKind::Strength, 0.2),
    slot(SessionKind::Strength, 0.2),
    slot(SessionKind::CrossTrain, 0.1),
    REST,
];

fn running(
    plan_type: PlanType,
    difficulty: Difficulty,
    weeks: (u32, u32),
    volume: (f64, f64),
) -> PlanTemplate {
    let (pattern, pace_min_per_km) = match difficulty {
        Difficulty::Beginner => (BEGINNER_RUNNING, 7.0),
        Difficulty::Intermediate => (INTERMEDIATE_RUNNING, 6.0),
        Difficulty::Advanced => (ADVANCED_RUNNING, 5.0),
    };

    PlanTemplate {
        plan_type,
        difficulty,
        min_weeks: weeks.0,
        max_weeks: weeks.1,
        unit: VolumeUnit::Kilometers,
        start_volume: volume.0,
        peak_volume: volume.1,
        taper_factor: 0.7,
        pace_min_per_km,
        pattern,
    }
}

fn strength(difficulty: Difficulty, minutes: (f64, f64)) -> PlanTemplate {
    let pattern = match difficulty {
        Difficulty::Beginner => BEGINNER_STRENGTH,
        Difficulty::Intermediate => INTERMEDIATE_STRENGTH,
        Difficulty::Advanced => ADVANCED_STRENGTH,
    };

    PlanTemplate {
        plan_type: PlanType::Strength,
        difficulty,
        min_weeks: 4,
        max_weeks: 16,
        unit: VolumeUnit::Minutes,
        start_volume: minutes.0,
        peak_volume: minutes.1,
        taper_factor: 0.6,
        pace_min_per_km: 0.0,
        pattern,
    }
}

/// Template lookup keyed by (plan type, difficulty).
pub struct TemplateTable {
    templates: HashMap<(PlanType, Difficulty), PlanTemplate>,
}

impl TemplateTable {
    fn standard() -> Self {
        use Difficulty::{Advanced, Beginner, Intermediate};
        use PlanType::{FiveK, HalfMarathon, Marathon, TenK};

        let templates = [
            running(FiveK, Beginner, (4, 12), (10.0, 20.0)),
            running(FiveK, Intermediate, (4, 12), (20.0, 35.0)),
            running(FiveK, Advanced, (4, 12), (35.0, 55.0)),
            running(TenK, Beginner, (6, 16), (15.0, 30.0)),
            running(TenK, Intermediate, (6, 16), (30.0, 50.0)),
            running(TenK, Advanced, (6, 16), (45.0, 70.0)),
            running(HalfMarathon, Beginner, (10, 20), (20.0, 40.0)),
            running(HalfMarathon, Intermediate, (8, 20), (35.0, 60.0)),
            running(HalfMarathon, Advanced, (8, 20), (50.0, 80.0)),
            // No beginner marathon: build up through a half marathon plan first
            running(Marathon, Intermediate, (12, 24), (40.0, 75.0)),
            running(Marathon, Advanced, (12, 24), (60.0, 100.0)),
            strength(Beginner, (90.0, 150.0)),
            strength(Intermediate, (150.0, 240.0)),
            strength(Advanced, (200.0, 300.0)),
        ];

        Self {
            templates: templates
                .into_iter()
                .map(|t| ((t.plan_type, t.difficulty), t))
                .collect(),
        }
    }

    pub fn get(&self, plan_type: PlanType, difficulty: Difficulty) -> Option<&PlanTemplate> {
        self.templates.get(&(plan_type, difficulty))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Process-wide template table.
pub fn template_table() -> &'static TemplateTable {
    static TABLE: OnceLock<TemplateTable> = OnceLock::new();
    TABLE.get_or_init(TemplateTable::standard)
}
