//! Concurrency tests.
//!
//! Concurrent syncs for the same user must never double-award a badge or
//! regress a personal record.

use chrono::{Duration, Utc};
use rusqlite::params;
use rustfit::records::RecordKind;
use rustfit::storage::EngineSettings;
use rustfit::workouts::{RunDetails, WorkoutPayload, WorkoutRecord};
use rustfit::ProgressEngine;
use std::thread;
use uuid::Uuid;

fn run(user: Uuid, hours_ago: i64, km: f64) -> WorkoutRecord {
    WorkoutRecord::new(
        user,
        Utc::now() - Duration::hours(hours_ago),
        (km * 360.0) as u32,
        WorkoutPayload::Run(RunDetails {
            distance_km: km,
            avg_pace_sec_per_km: None,
            avg_heart_rate: None,
            elevation_gain_m: None,
        }),
    )
}

fn award_rows(engine: &ProgressEngine, user: Uuid) -> i64 {
    engine
        .database()
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM badge_awards WHERE user_id = ?1",
            params![user.to_string()],
            |row| row.get(0),
        )
        .unwrap()
}

#[test]
fn test_concurrent_badge_sync_awards_once() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let user = Uuid::new_v4();
    for i in 0..10 {
        engine.database().insert_workout(&run(user, i + 1, 6.0)).unwrap();
    }

    let now = Utc::now();
    let awarded: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| engine.sync_badges(user, now).unwrap().len()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let earned = engine.list_badges(user).unwrap().into_iter().filter(|b| b.earned).count();
    assert!(earned >= 2, "first_workout and ten_workouts expected");
    assert_eq!(awarded, earned);
    assert_eq!(award_rows(&engine, user), earned as i64);
}

#[test]
fn test_concurrent_logging_keeps_best_record() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let user = Uuid::new_v4();
    let distances = [4.0, 12.0, 7.5, 9.0, 11.0, 3.0, 8.0, 10.5];

    thread::scope(|scope| {
        for (i, km) in distances.iter().enumerate() {
            let engine = &engine;
            scope.spawn(move || {
                engine.log_workout(run(user, i as i64 + 1, *km), Utc::now()).unwrap();
            });
        }
    });

    let longest = engine
        .list_records(user)
        .unwrap()
        .into_iter()
        .find(|r| r.record_type == RecordKind::LongestRun)
        .unwrap();
    assert_eq!(longest.value, 12.0);
    let first_workout = engine
        .list_badges(user)
        .unwrap()
        .into_iter()
        .filter(|b| b.badge.id == "first_workout")
        .collect::<Vec<_>>();
    assert_eq!(first_workout.len(), 1);
    assert!(first_workout[0].earned);
}

#[test]
fn test_different_users_do_not_interfere() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let users: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

    thread::scope(|scope| {
        for user in &users {
            let engine = &engine;
            scope.spawn(move || {
                for i in 0..3 {
                    engine.log_workout(run(*user, i + 1, 5.0), Utc::now()).unwrap();
                }
            });
        }
    });

    for user in &users {
        let records = engine.list_records(*user).unwrap();
        assert!(records.iter().all(|r| r.user_id == *user));
        assert!(!records.is_empty());
    }
}
