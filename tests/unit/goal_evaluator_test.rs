//! Unit tests for goal progress and status rules.

use chrono::{DateTime, Duration, Utc};
use rustfit::goals::evaluator::{days_remaining, derive_status, evaluation_for, progress_percent};
use rustfit::goals::{dispatch_table, Goal, GoalKind, GoalStatus};
use uuid::Uuid;

fn goal(kind: GoalKind, target: f64, end_at: DateTime<Utc>, status: GoalStatus) -> Goal {
    let now = Utc::now();
    Goal {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        kind,
        target,
        unit: "workouts".to_string(),
        start_at: end_at - Duration::days(7),
        end_at,
        current_value: 0.0,
        status,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_progress_is_clamped() {
    assert_eq!(progress_percent(0.0, 5.0), 0);
    assert_eq!(progress_percent(2.0, 5.0), 40);
    assert_eq!(progress_percent(5.0, 5.0), 100);
    assert_eq!(progress_percent(50.0, 5.0), 100);
    assert_eq!(progress_percent(f64::NAN, 5.0), 0);
}

#[test]
fn test_completion_checked_before_expiry() {
    let now = Utc::now();
    let past = now - Duration::days(1);
    let future = now + Duration::days(1);

    assert_eq!(derive_status(5.0, 5.0, now, past), GoalStatus::Completed);
    assert_eq!(derive_status(4.0, 5.0, now, past), GoalStatus::Failed);
    assert_eq!(derive_status(4.0, 5.0, now, future), GoalStatus::Active);
}

#[test]
fn test_days_remaining_rounds_up() {
    let now = Utc::now();
    assert_eq!(days_remaining(now, now + Duration::days(3)), 3);
    assert_eq!(days_remaining(now, now + Duration::hours(25)), 2);
    assert_eq!(days_remaining(now, now - Duration::days(2)), 0);
}

#[test]
fn test_weekly_goal_with_no_workouts() {
    let now = Utc::now();
    let weekly = goal(GoalKind::WeeklyWorkouts, 5.0, now + Duration::days(3), GoalStatus::Active);

    let evaluation = evaluation_for(&weekly, 0.0, now);
    assert_eq!(evaluation.current, 0.0);
    assert_eq!(evaluation.progress_percent, 0);
    assert_eq!(evaluation.status, GoalStatus::Active);
    assert_eq!(evaluation.days_remaining, 3);

    let evaluation = evaluation_for(&weekly, 5.0, now);
    assert_eq!(evaluation.status, GoalStatus::Completed);
    assert_eq!(evaluation.progress_percent, 100);
}

#[test]
fn test_failed_goal_completes_once_target_reached() {
    let now = Utc::now();
    let failed = goal(GoalKind::WeeklyWorkouts, 5.0, now - Duration::days(1), GoalStatus::Failed);
    assert_eq!(evaluation_for(&failed, 4.0, now).status, GoalStatus::Failed);

    let evaluation = evaluation_for(&failed, 9.0, now);
    assert_eq!(evaluation.status, GoalStatus::Completed);
    assert_eq!(evaluation.progress_percent, 100);
}

#[test]
fn test_completed_goal_stays_completed() {
    let now = Utc::now();
    let completed = goal(GoalKind::WeeklyWorkouts, 5.0, now - Duration::days(1), GoalStatus::Completed);
    assert_eq!(evaluation_for(&completed, 1.0, now).status, GoalStatus::Completed);
}

#[test]
fn test_dispatch_table_covers_supported_kinds() {
    let table = dispatch_table();
    for kind in [
        GoalKind::WeeklyWorkouts,
        GoalKind::MonthlyWorkouts,
        GoalKind::WeeklyDistance,
        GoalKind::MonthlyDistance,
        GoalKind::Duration,
        GoalKind::Streak,
        GoalKind::DistanceMilestone,
    ] {
        assert!(table.lookup(&kind).is_some(), "{kind:?}");
    }
    assert!(table.lookup(&GoalKind::Legacy("steps".to_string())).is_none());
}
