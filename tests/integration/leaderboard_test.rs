//! Integration tests for friends and global leaderboards.

use chrono::{Duration, TimeZone, Utc};
use rustfit::leaderboards::{LeaderboardMetric, LeaderboardScope};
use rustfit::storage::EngineSettings;
use rustfit::workouts::{RunDetails, TimeRange, Window, WorkoutPayload, WorkoutRecord};
use rustfit::ProgressEngine;
use uuid::Uuid;

fn run_at(user: Uuid, at: chrono::DateTime<Utc>, km: f64) -> WorkoutRecord {
    WorkoutRecord::new(
        user,
        at,
        1800,
        WorkoutPayload::Run(RunDetails {
            distance_km: km,
            avg_pace_sec_per_km: None,
            avg_heart_rate: None,
            elevation_gain_m: None,
        }),
    )
}

#[test]
fn test_friends_scope_is_requester_and_followees() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let (me, friend, stranger) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let now = Utc::now();

    engine.follow(me, friend, now).unwrap();
    engine.log_workout(run_at(me, now - Duration::days(3), 5.0), now).unwrap();
    engine.log_workout(run_at(friend, now - Duration::days(2), 8.0), now).unwrap();
    engine.log_workout(run_at(stranger, now - Duration::days(1), 20.0), now).unwrap();

    let friends = engine
        .get_leaderboard(LeaderboardScope::Friends, LeaderboardMetric::Distance, TimeRange::AllTime, me, now)
        .unwrap();
    let users: Vec<Uuid> = friends.entries.iter().map(|e| e.user_id).collect();
    assert_eq!(users, vec![friend, me]);
    assert_eq!(friends.current_user_entry.unwrap().rank, 2);

    let global = engine
        .get_leaderboard(LeaderboardScope::Global, LeaderboardMetric::Distance, TimeRange::AllTime, me, now)
        .unwrap();
    assert_eq!(global.entries.len(), 3);
    assert_eq!(global.entries[0].user_id, stranger);
    assert_eq!(global.unit, "km");
}

#[test]
fn test_equal_values_rank_by_who_got_there_first() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let (early, late) = (Uuid::new_v4(), Uuid::new_v4());
    let now = Utc::now();

    engine.log_workout(run_at(late, now - Duration::hours(1), 10.0), now).unwrap();
    engine.log_workout(run_at(early, now - Duration::hours(5), 10.0), now).unwrap();

    let board = engine
        .get_leaderboard(LeaderboardScope::Global, LeaderboardMetric::Workouts, TimeRange::AllTime, late, now)
        .unwrap();
    assert_eq!(board.entries[0].user_id, early);
    assert_eq!(board.entries[1].user_id, late);
    assert!(board.entries[1].is_current_user);

    let again = engine
        .get_leaderboard(LeaderboardScope::Global, LeaderboardMetric::Workouts, TimeRange::AllTime, late, now)
        .unwrap();
    assert_eq!(board, again);
}

#[test]
fn test_window_excludes_users_without_activity() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let (inside, outside) = (Uuid::new_v4(), Uuid::new_v4());
    let now = Utc::now();

    engine
        .log_workout(run_at(inside, Utc.with_ymd_and_hms(2024, 3, 12, 8, 0, 0).unwrap(), 5.0), now)
        .unwrap();
    engine
        .log_workout(run_at(outside, Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).unwrap(), 5.0), now)
        .unwrap();

    let march = Window::CalendarMonth { year: 2024, month: 3 };
    let board = engine
        .get_leaderboard_for(LeaderboardScope::Global, LeaderboardMetric::Duration, &march, outside)
        .unwrap();
    assert_eq!(board.entries.len(), 1);
    assert_eq!(board.entries[0].user_id, inside);
    assert_eq!(board.entries[0].value, 30.0);
    assert!(board.current_user_entry.is_none());
}
