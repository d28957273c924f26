//! Unit tests for workout aggregation and streaks.

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use rustfit::workouts::aggregator::{current_streak, longest_streak, summarize};
use rustfit::workouts::{
    BiometricDetails, RunDetails, Window, WorkoutKind, WorkoutPayload, WorkoutRecord,
};
use std::collections::BTreeSet;
use uuid::Uuid;

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn days(list: &[u32]) -> BTreeSet<NaiveDate> {
    list.iter().map(|&d| day(d)).collect()
}

fn run(user: Uuid, d: u32, hour: u32, km: f64) -> WorkoutRecord {
    WorkoutRecord::new(
        user,
        Utc.with_ymd_and_hms(2024, 5, d, hour, 0, 0).unwrap(),
        1800,
        WorkoutPayload::Run(RunDetails {
            distance_km: km,
            avg_pace_sec_per_km: None,
            avg_heart_rate: None,
            elevation_gain_m: None,
        }),
    )
}

fn weigh_in(user: Uuid, d: u32) -> WorkoutRecord {
    WorkoutRecord::new(
        user,
        Utc.with_ymd_and_hms(2024, 5, d, 7, 0, 0).unwrap(),
        0,
        WorkoutPayload::Biometrics(BiometricDetails {
            weight_kg: Some(72.5),
            resting_heart_rate: None,
            body_fat_percent: None,
        }),
    )
}

#[test]
fn test_streak_counts_today() {
    assert_eq!(current_streak(&days(&[8, 9, 10]), day(10)), 3);
}

#[test]
fn test_streak_survives_until_a_full_day_is_skipped() {
    // Nothing yet today, but yesterday keeps the streak alive
    assert_eq!(current_streak(&days(&[8, 9, 10]), day(11)), 3);
    assert_eq!(current_streak(&days(&[8, 9, 10]), day(12)), 0);
}

#[test]
fn test_streak_stops_at_gap() {
    assert_eq!(current_streak(&days(&[1, 2, 5, 6]), day(6)), 2);
    assert_eq!(current_streak(&BTreeSet::new(), day(6)), 0);
}

#[test]
fn test_longest_streak() {
    assert_eq!(longest_streak(&days(&[1, 2, 3, 7, 8, 20])), 3);
    assert_eq!(longest_streak(&BTreeSet::new()), 0);
}

#[test]
fn test_biometrics_excluded_unless_requested() {
    let user = Uuid::new_v4();
    let records = vec![run(user, 3, 8, 5.0), weigh_in(user, 3), run(user, 4, 8, 8.0)];

    let training = summarize(&records, None, utc());
    assert_eq!(training.count, 2);
    assert_eq!(training.total_distance_km, 13.0);
    assert_eq!(training.longest_run_km, 8.0);
    assert_eq!(training.count_of(WorkoutKind::Biometrics), 0);

    let biometrics = summarize(&records, Some(WorkoutKind::Biometrics), utc());
    assert_eq!(biometrics.count, 1);
}

#[test]
fn test_empty_window_is_all_zero() {
    let aggregates = summarize(&[], None, utc());
    assert_eq!(aggregates.count, 0);
    assert_eq!(aggregates.total_duration_minutes(), 0.0);
    assert!(aggregates.per_day.is_empty());
    assert!(aggregates.last_workout_at.is_none());
}

#[test]
fn test_offset_moves_workout_to_next_day() {
    let user = Uuid::new_v4();
    let late = run(user, 3, 23, 5.0);
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

    let aggregates = summarize(&[late], None, plus_two);
    assert!(aggregates.per_day.contains_key(&day(4)));
}

#[test]
fn test_calendar_week_starts_monday() {
    // 2024-05-08 is a Wednesday
    let bounds = Window::CalendarWeek { containing: day(8) }.bounds(utc()).unwrap();
    assert_eq!(bounds.from, Some(Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap()));
    assert_eq!(bounds.to, Some(Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap()));
}

#[test]
fn test_inverted_custom_window_is_rejected() {
    let now = Utc::now();
    let window = Window::Custom {
        from: now,
        to: now - Duration::days(1),
    };
    assert!(window.bounds(utc()).is_err());
}
