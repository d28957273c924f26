//! Unit tests for personal record candidate extraction.

use chrono::Utc;
use rustfit::records::{candidates, Direction, RecordKind};
use rustfit::workouts::{
    CardioDetails, ExerciseSet, LiftDetails, RunDetails, WorkoutPayload, WorkoutRecord,
};
use uuid::Uuid;

const TOLERANCE: f64 = 3.0;

fn run(km: f64, seconds: u32) -> WorkoutRecord {
    WorkoutRecord::new(
        Uuid::new_v4(),
        Utc::now(),
        seconds,
        WorkoutPayload::Run(RunDetails {
            distance_km: km,
            avg_pace_sec_per_km: None,
            avg_heart_rate: None,
            elevation_gain_m: None,
        }),
    )
}

fn value_of(workout: &WorkoutRecord, kind: &RecordKind) -> Option<f64> {
    candidates(workout, TOLERANCE)
        .into_iter()
        .find(|c| &c.kind == kind)
        .map(|c| c.value)
}

#[test]
fn test_run_near_5k_yields_pace_record() {
    let workout = run(5.0, 1500);
    assert_eq!(value_of(&workout, &RecordKind::Fastest5k), Some(300.0));
    assert_eq!(value_of(&workout, &RecordKind::LongestRun), Some(5.0));
    assert_eq!(value_of(&workout, &RecordKind::Fastest10k), None);

    // 2% short still counts
    let short = run(4.9, 1470);
    let pace = value_of(&short, &RecordKind::Fastest5k).unwrap();
    assert!((pace - 300.0).abs() < 1e-9);
}

#[test]
fn test_run_outside_tolerance_has_no_pace_record() {
    let workout = run(6.0, 1800);
    assert!(candidates(&workout, TOLERANCE)
        .iter()
        .all(|c| c.kind == RecordKind::LongestRun));
}

#[test]
fn test_lift_keeps_heaviest_set_per_exercise() {
    let workout = WorkoutRecord::new(
        Uuid::new_v4(),
        Utc::now(),
        3600,
        WorkoutPayload::Lift(LiftDetails {
            exercises: vec![
                ExerciseSet {
                    name: "Bench Press".to_string(),
                    sets: 3,
                    reps: 8,
                    weight_kg: 80.0,
                },
                ExerciseSet {
                    name: "bench-press".to_string(),
                    sets: 1,
                    reps: 3,
                    weight_kg: 95.0,
                },
                ExerciseSet {
                    name: "Squat".to_string(),
                    sets: 5,
                    reps: 5,
                    weight_kg: 120.0,
                },
            ],
        }),
    );

    let found = candidates(&workout, TOLERANCE);
    assert_eq!(found.len(), 2);
    assert_eq!(
        value_of(&workout, &RecordKind::Heaviest("bench_press".to_string())),
        Some(95.0)
    );
    assert_eq!(value_of(&workout, &RecordKind::Heaviest("squat".to_string())), Some(120.0));
}

#[test]
fn test_cardio_records_minutes() {
    let workout = WorkoutRecord::new(
        Uuid::new_v4(),
        Utc::now(),
        2700,
        WorkoutPayload::Cardio(CardioDetails {
            activity: "rowing".to_string(),
            distance_km: Some(8.0),
            avg_heart_rate: None,
            calories: None,
        }),
    );
    assert_eq!(value_of(&workout, &RecordKind::LongestCardio), Some(45.0));
}

#[test]
fn test_pace_improvement_direction() {
    // 5:10/km replaced by 4:50/km
    let direction = RecordKind::Fastest5k.direction();
    assert_eq!(direction, Direction::Min);
    assert!(direction.is_better(290.0, 310.0));
    assert!(!direction.is_better(320.0, 310.0));
}

#[test]
fn test_record_keys_round_trip() {
    for key in ["fastest_5k", "longest_run", "heaviest_deadlift", "longest_cardio"] {
        assert_eq!(RecordKind::parse(key).unwrap().key(), key);
    }
    assert_eq!(RecordKind::parse("heaviest_"), None);
    assert_eq!(RecordKind::parse("fastest_mile"), None);
}
