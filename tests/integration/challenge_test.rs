//! Integration tests for challenges and the follow graph.

use chrono::{Duration, Utc};
use rustfit::leaderboards::LeaderboardMetric;
use rustfit::social::NewChallenge;
use rustfit::storage::EngineSettings;
use rustfit::workouts::{RunDetails, WorkoutPayload, WorkoutRecord};
use rustfit::{EngineError, ProgressEngine, WriteOutcome};
use uuid::Uuid;

fn run(user: Uuid, hours_ago: i64, km: f64) -> WorkoutRecord {
    WorkoutRecord::new(
        user,
        Utc::now() - Duration::hours(hours_ago),
        1800,
        WorkoutPayload::Run(RunDetails {
            distance_km: km,
            avg_pace_sec_per_km: None,
            avg_heart_rate: None,
            elevation_gain_m: None,
        }),
    )
}

fn distance_challenge(target: f64) -> NewChallenge {
    let now = Utc::now();
    NewChallenge {
        name: "Spring 50".to_string(),
        description: Some("Run 50 km before the end of the month".to_string()),
        metric: LeaderboardMetric::Distance,
        target,
        start_at: now - Duration::days(2),
        end_at: now + Duration::days(10),
    }
}

#[test]
fn test_challenge_progress_and_ranking() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let now = Utc::now();

    let challenge = engine.create_challenge(alice, distance_challenge(15.0), now).unwrap();
    assert_eq!(engine.join_challenge(challenge.id, alice, now).unwrap(), WriteOutcome::Applied);
    assert_eq!(
        engine.join_challenge(challenge.id, alice, now).unwrap(),
        WriteOutcome::AlreadyHandled
    );
    engine.join_challenge(challenge.id, bob, now).unwrap();

    engine.log_workout(run(alice, 5, 8.0), now).unwrap();
    engine.log_workout(run(alice, 3, 9.0), now).unwrap();
    engine.log_workout(run(bob, 4, 6.0), now).unwrap();
    // Before the challenge window
    engine.log_workout(run(bob, 24 * 5, 30.0), now).unwrap();

    let alice_progress = engine.sync_challenge_progress(challenge.id, alice, now).unwrap();
    assert_eq!(alice_progress.progress, 17.0);
    assert!(alice_progress.completed());

    let bob_progress = engine.sync_challenge_progress(challenge.id, bob, now).unwrap();
    assert_eq!(bob_progress.progress, 6.0);
    assert!(!bob_progress.completed());

    let board = engine.challenge_leaderboard(challenge.id, bob).unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, alice);
    assert_eq!(board[1].rank, 2);
    assert!(board[1].is_current_user);

    let active = engine.active_challenges(bob, now).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].0.id, challenge.id);
}

#[test]
fn test_challenge_validation() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let user = Uuid::new_v4();

    let result = engine.create_challenge(user, distance_challenge(0.0), Utc::now());
    assert!(matches!(result, Err(EngineError::Validation { field: "target", .. })));

    let mut ended = distance_challenge(10.0);
    ended.end_at = Utc::now() - Duration::days(1);
    ended.start_at = ended.end_at - Duration::days(7);
    let result = engine.create_challenge(user, ended, Utc::now());
    assert!(matches!(result, Err(EngineError::Validation { field: "end_date", .. })));
}

#[test]
fn test_sync_without_joining_is_not_found() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let creator = Uuid::new_v4();
    let challenge = engine
        .create_challenge(creator, distance_challenge(10.0), Utc::now())
        .unwrap();

    let result = engine.sync_challenge_progress(challenge.id, Uuid::new_v4(), Utc::now());
    assert!(matches!(result, Err(EngineError::NotFound { .. })));
}

#[test]
fn test_follow_graph() {
    let engine = ProgressEngine::in_memory(EngineSettings::default()).unwrap();
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let now = Utc::now();

    assert_eq!(engine.follow(a, b, now).unwrap(), WriteOutcome::Applied);
    assert_eq!(engine.follow(a, b, now).unwrap(), WriteOutcome::AlreadyHandled);
    engine.follow(a, c, now).unwrap();

    let mut expected = vec![b, c];
    expected.sort();
    assert_eq!(engine.followees(a).unwrap(), expected);

    assert!(engine.unfollow(a, b).unwrap());
    assert_eq!(engine.followees(a).unwrap(), vec![c]);
}
