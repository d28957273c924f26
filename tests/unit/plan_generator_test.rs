//! Unit tests for training plan generation and completion tracking.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use rustfit::plans::tracker::{complete_workout, progress_percentage};
use rustfit::plans::{
    template_table, Difficulty, Phase, PhasePlan, PlanError, PlanGenerator, PlanStatus, PlanType,
};
use rustfit::WriteOutcome;
use uuid::Uuid;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

#[test]
fn test_same_inputs_give_same_schedule() {
    let generator = PlanGenerator::new();
    let first = generator
        .generate(Uuid::new_v4(), PlanType::FiveK, Difficulty::Beginner, 8, monday(), Utc::now())
        .unwrap();
    let second = generator
        .generate(Uuid::new_v4(), PlanType::FiveK, Difficulty::Beginner, 8, monday(), Utc::now())
        .unwrap();

    assert_eq!(first.weeks, second.weeks);
    assert_ne!(first.id, second.id);
}

#[test]
fn test_every_offered_template_generates() {
    let generator = PlanGenerator::new();
    for plan_type in PlanType::all() {
        for difficulty in Difficulty::all() {
            let Some(template) = template_table().get(plan_type, difficulty) else {
                continue;
            };
            for weeks in [template.min_weeks, template.max_weeks] {
                let plan = generator
                    .generate(Uuid::new_v4(), plan_type, difficulty, weeks, monday(), Utc::now())
                    .unwrap();
                assert_eq!(plan.weeks.len(), weeks as usize);
                assert_eq!(plan.weeks.last().unwrap().phase, Phase::Taper);
                assert_eq!(plan.weeks[0].phase, Phase::Base);
                assert!(plan.total_sessions() > 0);
            }
        }
    }
}

#[test]
fn test_taper_length_depends_on_duration() {
    assert_eq!(PhasePlan::for_duration(10).taper, 1);
    assert_eq!(PhasePlan::for_duration(12).taper, 2);
    for weeks in 4..=24 {
        assert_eq!(PhasePlan::for_duration(weeks).total(), weeks);
    }
}

#[test]
fn test_plan_starting_midweek_follows_weekdays() {
    let thursday = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
    let plan = PlanGenerator::new()
        .generate(Uuid::new_v4(), PlanType::TenK, Difficulty::Intermediate, 6, thursday, Utc::now())
        .unwrap();

    let first = &plan.weeks[0];
    assert_eq!(first.workouts[0].day, Weekday::Thu);
    for workout in &first.workouts {
        assert_eq!(workout.day, workout.date.weekday());
    }
    assert_eq!(plan.end_date(), thursday + chrono::Duration::weeks(6));
}

#[test]
fn test_unknown_template_is_an_error() {
    let result = PlanGenerator::new().generate(
        Uuid::new_v4(),
        PlanType::Marathon,
        Difficulty::Beginner,
        16,
        monday(),
        Utc::now(),
    );
    assert!(matches!(
        result,
        Err(PlanError::UnknownTemplate {
            plan_type: PlanType::Marathon,
            difficulty: Difficulty::Beginner
        })
    ));
}

#[test]
fn test_progress_rounds_to_nearest_percent() {
    let mut plan = PlanGenerator::new()
        .generate(Uuid::new_v4(), PlanType::FiveK, Difficulty::Intermediate, 4, monday(), Utc::now())
        .unwrap();
    // 5 sessions a week over 4 weeks
    assert_eq!(plan.total_sessions(), 20);

    complete_workout(&mut plan, 3, Weekday::Tue, Utc::now()).unwrap();
    assert_eq!(progress_percentage(&plan), 5);
    assert_eq!(plan.progress_percentage, 5);

    let outcome = complete_workout(&mut plan, 3, Weekday::Tue, Utc::now()).unwrap();
    assert_eq!(outcome, WriteOutcome::AlreadyHandled);
    assert_eq!(plan.status, PlanStatus::Active);
}
