//! Periodized plan generation.
//!
//! A plan is split into base, build, peak and taper phases. Weekly volume
//! climbs linearly from the template's start volume to its peak volume over
//! the pre-taper weeks and then drops by the taper factor each taper week.
//! Generation is a pure function of the template, duration and start date.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use uuid::Uuid;

use super::manager::PlanError;
use super::templates::{template_table, PlanTemplate, VolumeUnit};
use super::types::{
    Difficulty, Phase, PlanStatus, PlanType, PlanWeek, PlanWorkout, SessionKind, TrainingPlan,
};

/// Number of weeks in each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePlan {
    pub base: u32,
    pub build: u32,
    pub peak: u32,
    pub taper: u32,
}

impl PhasePlan {
    /// Split `weeks` into phases. Longer plans get a two-week taper.
    pub fn for_duration(weeks: u32) -> Self {
        let taper = if weeks >= 12 { 2 } else { 1 };
        let training = weeks.saturating_sub(taper);
        let peak = (training / 5).max(1).min(training);
        let base = (training - peak).div_ceil(2);
        let build = training - peak - base;

        Self {
            base,
            build,
            peak,
            taper,
        }
    }

    pub fn total(&self) -> u32 {
        self.base + self.build + self.peak + self.taper
    }

    /// Phase of a zero-based week index.
    pub fn phase_of(&self, index: u32) -> Phase {
        if index < self.base {
            Phase::Base
        } else if index < self.base + self.build {
            Phase::Build
        } else if index < self.base + self.build + self.peak {
            Phase::Peak
        } else {
            Phase::Taper
        }
    }

    fn pre_taper(&self) -> u32 {
        self.base + self.build + self.peak
    }
}

/// Weekly volume curve for a template over `weeks` weeks.
pub fn volume_curve(template: &PlanTemplate, phases: &PhasePlan) -> Vec<f64> {
    let ramp = phases.pre_taper();
    let mut volumes: Vec<f64> = (0..ramp)
        .map(|i| {
            if ramp <= 1 {
                template.peak_volume
            } else {
                let t = f64::from(i) / f64::from(ramp - 1);
                template.start_volume + (template.peak_volume - template.start_volume) * t
            }
        })
        .collect();

    let mut last = volumes.last().copied().unwrap_or(template.start_volume);
    for _ in 0..phases.taper {
        last *= template.taper_factor;
        volumes.push(last);
    }

    volumes
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Session actually prescribed in a phase. Early and taper weeks swap
/// interval work for tempo.
fn session_for(phase: Phase, session: SessionKind) -> SessionKind {
    match (phase, session) {
        (Phase::Base | Phase::Taper, SessionKind::Intervals) => SessionKind::Tempo,
        _ => session,
    }
}

fn build_workout(
    template: &PlanTemplate,
    phase: Phase,
    date: NaiveDate,
    week_volume: f64,
) -> PlanWorkout {
    let slot = template.pattern[date.weekday().num_days_from_monday() as usize];
    let session = session_for(phase, slot.session);
    let volume = week_volume * slot.share;

    let (duration_minutes, distance_km) = if session.is_rest() {
        (0, None)
    } else {
        match template.unit {
            VolumeUnit::Kilometers => {
                let distance = round_tenth(volume);
                let minutes = (distance * template.pace_min_per_km).round() as u32;
                (minutes, Some(distance))
            }
            VolumeUnit::Minutes => (volume.round() as u32, None),
        }
    };

    PlanWorkout {
        day: date.weekday(),
        date,
        session,
        duration_minutes,
        distance_km,
        intensity: session.intensity(),
        completed: false,
        completed_at: None,
    }
}

/// Build the week schedule for a template.
pub fn build_weeks(template: &PlanTemplate, duration_weeks: u32, start_date: NaiveDate) -> Vec<PlanWeek> {
    let phases = PhasePlan::for_duration(duration_weeks);
    let volumes = volume_curve(template, &phases);

    volumes
        .iter()
        .zip(0u32..)
        .map(|(&volume, index)| {
            let phase = phases.phase_of(index);
            let week_start = start_date + Duration::weeks(i64::from(index));
            let workouts = (0..7)
                .map(|offset| build_workout(template, phase, week_start + Duration::days(offset), volume))
                .collect();

            PlanWeek {
                week_number: index + 1,
                phase,
                start_date: week_start,
                target_volume: round_tenth(volume),
                workouts,
            }
        })
        .collect()
}

/// Plan generator over the process-wide template table.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanGenerator;

impl PlanGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Look up the template for a combination.
    pub fn template(
        &self,
        plan_type: PlanType,
        difficulty: Difficulty,
    ) -> Result<&'static PlanTemplate, PlanError> {
        template_table()
            .get(plan_type, difficulty)
            .ok_or(PlanError::UnknownTemplate {
                plan_type,
                difficulty,
            })
    }

    /// Generate a new active plan starting on `start_date`.
    pub fn generate(
        &self,
        user_id: Uuid,
        plan_type: PlanType,
        difficulty: Difficulty,
        duration_weeks: u32,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<TrainingPlan, PlanError> {
        let template = self.template(plan_type, difficulty)?;

        if duration_weeks < template.min_weeks || duration_weeks > template.max_weeks {
            return Err(PlanError::Validation {
                field: "duration_weeks",
                message: format!(
                    "{} {} plans run {} to {} weeks",
                    difficulty,
                    plan_type.display_name(),
                    template.min_weeks,
                    template.max_weeks
                ),
            });
        }

        Ok(TrainingPlan {
            id: Uuid::new_v4(),
            user_id,
            plan_type,
            difficulty,
            duration_weeks,
            start_date,
            status: PlanStatus::Active,
            current_week: 1,
            progress_percentage: 0,
            weeks: build_weeks(template, duration_weeks, start_date),
            created_at: now,
            updated_at: now,
        })
    }
}
