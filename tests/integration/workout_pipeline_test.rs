//! Integration tests for the workout pipeline.
//!
//! Logging a workout persists it, updates personal records and awards
//! badges; goals are evaluated on read.

use chrono::{DateTime, Duration, Utc};
use rustfit::goals::{GoalKind, GoalStatus};
use rustfit::records::RecordKind;
use rustfit::storage::config::load_config_from;
use rustfit::storage::EngineSettings;
use rustfit::workouts::{RunDetails, WorkoutPayload, WorkoutRecord};
use rustfit::{EngineError, ProgressEngine};
use tempfile::TempDir;
use uuid::Uuid;

fn engine() -> ProgressEngine {
    ProgressEngine::in_memory(EngineSettings::default()).unwrap()
}

fn run(user: Uuid, at: DateTime<Utc>, km: f64, seconds: u32) -> WorkoutRecord {
    WorkoutRecord::new(
        user,
        at,
        seconds,
        WorkoutPayload::Run(RunDetails {
            distance_km: km,
            avg_pace_sec_per_km: None,
            avg_heart_rate: None,
            elevation_gain_m: None,
        }),
    )
}

#[test]
fn test_weekly_goal_completes_after_five_workouts() {
    let engine = engine();
    let user = Uuid::new_v4();
    let now = Utc::now();

    let goal = engine
        .create_goal(user, GoalKind::WeeklyWorkouts, 5.0, now + Duration::days(3), now)
        .unwrap();

    let evaluation = engine.evaluate_goal(goal.id, user, now).unwrap();
    assert_eq!(evaluation.current, 0.0);
    assert_eq!(evaluation.progress_percent, 0);
    assert_eq!(evaluation.status, GoalStatus::Active);
    assert_eq!(evaluation.days_remaining, 3);

    for i in 0..5 {
        let at = now - Duration::hours(i + 1);
        engine.log_workout(run(user, at, 3.0, 1200), now).unwrap();
    }

    let evaluation = engine.evaluate_goal(goal.id, user, now).unwrap();
    assert_eq!(evaluation.current, 5.0);
    assert_eq!(evaluation.status, GoalStatus::Completed);
    assert_eq!(evaluation.progress_percent, 100);

    let completed = engine.list_goals(user, Some(GoalStatus::Completed), now).unwrap();
    assert_eq!(completed.len(), 1);
    assert!(engine.list_goals(user, Some(GoalStatus::Active), now).unwrap().is_empty());
}

#[test]
fn test_goal_owned_by_someone_else_is_not_found() {
    let engine = engine();
    let owner = Uuid::new_v4();
    let now = Utc::now();
    let goal = engine
        .create_goal(owner, GoalKind::MonthlyDistance, 100.0, now + Duration::days(20), now)
        .unwrap();

    let result = engine.evaluate_goal(goal.id, Uuid::new_v4(), now);
    assert!(matches!(result, Err(EngineError::NotFound { entity: "Goal", .. })));
    assert!(engine.delete_goal(goal.id, Uuid::new_v4()).is_err());
    engine.delete_goal(goal.id, owner).unwrap();
}

#[test]
fn test_longest_run_improves_by_25_percent() {
    let engine = engine();
    let user = Uuid::new_v4();
    let now = Utc::now();

    engine.log_workout(run(user, now - Duration::days(2), 10.0, 3600), now).unwrap();
    let outcome = engine.log_workout(run(user, now - Duration::days(1), 12.5, 4500), now).unwrap();

    let longest = outcome
        .new_records
        .iter()
        .find(|r| r.record_type == RecordKind::LongestRun)
        .unwrap();
    assert_eq!(longest.value, 12.5);
    assert_eq!(longest.previous_value, Some(10.0));
    assert_eq!(longest.improvement_percent, Some(25.0));
}

#[test]
fn test_slower_5k_leaves_record_alone() {
    let engine = engine();
    let user = Uuid::new_v4();
    let now = Utc::now();

    // 5:10/km, then 4:50/km, then 5:20/km
    engine.log_workout(run(user, now - Duration::days(3), 5.0, 1550), now).unwrap();
    let faster = engine.log_workout(run(user, now - Duration::days(2), 5.0, 1450), now).unwrap();
    let improved = faster
        .new_records
        .iter()
        .find(|r| r.record_type == RecordKind::Fastest5k)
        .unwrap();
    assert!(improved.improvement_percent.unwrap() > 0.0);

    let slower = engine.log_workout(run(user, now - Duration::days(1), 5.0, 1600), now).unwrap();
    assert!(slower.new_records.iter().all(|r| r.record_type != RecordKind::Fastest5k));

    let record = engine
        .list_records(user)
        .unwrap()
        .into_iter()
        .find(|r| r.record_type == RecordKind::Fastest5k)
        .unwrap();
    assert_eq!(record.value, 290.0);
}

#[test]
fn test_badge_sync_is_idempotent() {
    let engine = engine();
    let user = Uuid::new_v4();
    let now = Utc::now();

    let outcome = engine.log_workout(run(user, now, 5.0, 1500), now).unwrap();
    assert!(!outcome.new_badges.is_empty());

    assert!(engine.sync_badges(user, now).unwrap().is_empty());
    assert!(engine.sync_badges(user, now).unwrap().is_empty());

    let earned: Vec<_> = engine
        .list_badges(user)
        .unwrap()
        .into_iter()
        .filter(|b| b.earned)
        .collect();
    assert_eq!(earned.len(), outcome.new_badges.len());
}

#[test]
fn test_edit_does_not_roll_back_record() {
    let engine = engine();
    let user = Uuid::new_v4();
    let now = Utc::now();

    let outcome = engine.log_workout(run(user, now - Duration::hours(2), 15.0, 5400), now).unwrap();
    let mut edited = outcome.workout;
    edited.payload = WorkoutPayload::Run(RunDetails {
        distance_km: 8.0,
        avg_pace_sec_per_km: None,
        avg_heart_rate: None,
        elevation_gain_m: None,
    });
    engine.update_workout(edited.clone(), now).unwrap();

    assert_eq!(engine.get_workout(edited.id, user).unwrap().distance_km(), Some(8.0));
    let longest = engine
        .list_records(user)
        .unwrap()
        .into_iter()
        .find(|r| r.record_type == RecordKind::LongestRun)
        .unwrap();
    assert_eq!(longest.value, 15.0);
}

#[test]
fn test_file_backed_engine_keeps_state() {
    let dir = TempDir::new().unwrap();
    let config = load_config_from(&dir.path().join("config.toml"), dir.path().to_path_buf()).unwrap();
    let user = Uuid::new_v4();
    let now = Utc::now();

    {
        let engine = ProgressEngine::open(&config).unwrap();
        engine.log_workout(run(user, now, 7.0, 2400), now).unwrap();
    }

    let engine = ProgressEngine::open(&config).unwrap();
    assert_eq!(engine.list_records(user).unwrap().len(), 1);
    assert!(engine.list_badges(user).unwrap().iter().any(|b| b.earned));
}
