//! Integration tests for training plan lifecycle.

use chrono::{Duration, NaiveDate, TimeZone, Utc, Weekday};
use rustfit::plans::{Difficulty, PlanStatus, PlanType};
use rustfit::storage::EngineSettings;
use rustfit::{EngineError, ProgressEngine};
use uuid::Uuid;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
}

fn engine() -> ProgressEngine {
    ProgressEngine::in_memory(EngineSettings::default()).unwrap()
}

#[test]
fn test_completing_all_sessions_completes_plan() {
    let engine = engine();
    let user = Uuid::new_v4();
    let now = Utc.with_ymd_and_hms(2025, 2, 4, 7, 0, 0).unwrap();

    let plan = engine
        .generate_plan(user, PlanType::Strength, Difficulty::Beginner, 4, start(), now)
        .unwrap();
    let sessions: Vec<(u32, Weekday)> = plan
        .weeks
        .iter()
        .flat_map(|w| {
            w.workouts
                .iter()
                .filter(|d| !d.is_rest())
                .map(move |d| (w.week_number, d.day))
        })
        .collect();
    assert_eq!(sessions.len(), 12);

    let mut last = None;
    for (week, day) in sessions {
        let completion = engine.complete_workout(plan.id, user, week, day, now).unwrap();
        assert!(completion.newly_completed);
        last = Some(completion.plan);
    }

    let finished = last.unwrap();
    assert_eq!(finished.status, PlanStatus::Completed);
    assert_eq!(finished.progress_percentage, 100);

    let repeat = engine.complete_workout(plan.id, user, 1, Weekday::Mon, now).unwrap();
    assert!(!repeat.newly_completed);
    assert_eq!(engine.get_plan(plan.id, user, now).unwrap().status, PlanStatus::Completed);
}

#[test]
fn test_expired_plan_fails_on_read() {
    let engine = engine();
    let user = Uuid::new_v4();
    let now = Utc.with_ymd_and_hms(2025, 2, 4, 7, 0, 0).unwrap();
    let plan = engine
        .generate_plan(user, PlanType::FiveK, Difficulty::Beginner, 4, start(), now)
        .unwrap();

    let later = now + Duration::weeks(20);
    assert_eq!(engine.get_plan(plan.id, user, later).unwrap().status, PlanStatus::Failed);
    let result = engine.complete_workout(plan.id, user, 1, Weekday::Tue, later);
    assert!(matches!(result, Err(EngineError::Validation { field: "status", .. })));
}

#[test]
fn test_plan_requests_are_validated() {
    let engine = engine();
    let user = Uuid::new_v4();
    let now = Utc::now();

    let result = engine.generate_plan(user, PlanType::Marathon, Difficulty::Beginner, 16, start(), now);
    assert!(matches!(result, Err(EngineError::Validation { field: "plan_type", .. })));

    let result = engine.generate_plan(user, PlanType::FiveK, Difficulty::Beginner, 2, start(), now);
    assert!(matches!(result, Err(EngineError::Validation { field: "duration_weeks", .. })));

    let result = engine.get_plan(Uuid::new_v4(), user, now);
    assert!(matches!(result, Err(EngineError::NotFound { entity: "TrainingPlan", .. })));
}

#[test]
fn test_week_navigation_does_not_gate_completion() {
    let engine = engine();
    let user = Uuid::new_v4();
    let now = Utc.with_ymd_and_hms(2025, 2, 4, 7, 0, 0).unwrap();
    let plan = engine
        .generate_plan(user, PlanType::TenK, Difficulty::Beginner, 6, start(), now)
        .unwrap();

    let moved = engine.set_current_week(plan.id, user, 3, now).unwrap();
    assert_eq!(moved.current_week, 3);

    let completion = engine.complete_workout(plan.id, user, 5, Weekday::Sat, now).unwrap();
    assert!(completion.newly_completed);
    assert_eq!(completion.plan.current_week, 3);
    assert_eq!(engine.list_plans(user).unwrap().len(), 1);
}
