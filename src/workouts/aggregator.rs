//! Windowed workout aggregation.
//!
//! Turns a user's raw workout log into sums, counts, per-day buckets and
//! streaks on demand. Nothing is cached between calls: the workout store is
//! the source of truth, so edits and deletes are visible on the next read.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use uuid::Uuid;

use super::types::{WorkoutKind, WorkoutRecord};
use crate::storage::DatabaseError;

/// Query handed to the workout store.
///
/// `from` is inclusive and `to` exclusive. When `kind` is `None` every kind is
/// returned; filtering out non-training kinds is the aggregator's job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkoutQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kind: Option<WorkoutKind>,
}

/// Read access to a user's workout log.
pub trait WorkoutSource {
    /// Find a user's workouts matching the query, oldest first.
    fn find_workouts(
        &self,
        user_id: Uuid,
        query: &WorkoutQuery,
    ) -> Result<Vec<WorkoutRecord>, DatabaseError>;
}

/// Time window over which aggregates are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "window", rename_all = "snake_case")]
pub enum Window {
    /// Explicit half-open range
    Custom {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    /// Monday-to-Sunday week containing the given local date
    CalendarWeek { containing: NaiveDate },
    /// Calendar month in local time
    CalendarMonth { year: i32, month: u32 },
    /// Calendar year in local time
    CalendarYear { year: i32 },
    /// Everything ever logged
    AllTime,
}

/// Relative period, resolved against "now" when a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    ThisWeek,
    ThisMonth,
    ThisYear,
    AllTime,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ThisWeek => "this_week",
            TimeRange::ThisMonth => "this_month",
            TimeRange::ThisYear => "this_year",
            TimeRange::AllTime => "all_time",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "this_week" | "week" => Some(TimeRange::ThisWeek),
            "this_month" | "month" => Some(TimeRange::ThisMonth),
            "this_year" | "year" => Some(TimeRange::ThisYear),
            "all_time" | "all" => Some(TimeRange::AllTime),
            _ => None,
        }
    }

    /// Concrete window for this period as seen from `now`.
    pub fn window(&self, now: DateTime<Utc>, offset: FixedOffset) -> Window {
        let today = local_date(now, offset);
        match self {
            TimeRange::ThisWeek => Window::CalendarWeek { containing: today },
            TimeRange::ThisMonth => Window::CalendarMonth {
                year: today.year(),
                month: today.month(),
            },
            TimeRange::ThisYear => Window::CalendarYear { year: today.year() },
            TimeRange::AllTime => Window::AllTime,
        }
    }
}

/// Resolved UTC bounds of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeBounds {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeBounds {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at < to)
    }
}

impl Window {
    /// Resolve to UTC bounds using the user's UTC offset.
    pub fn bounds(&self, offset: FixedOffset) -> Result<TimeBounds, AggregateError> {
        match *self {
            Window::Custom { from, to } => {
                if to < from {
                    return Err(AggregateError::InvalidWindow(format!(
                        "custom window ends ({to}) before it starts ({from})"
                    )));
                }
                Ok(TimeBounds {
                    from: Some(from),
                    to: Some(to),
                })
            }
            Window::CalendarWeek { containing } => {
                let monday = containing
                    - Duration::days(containing.weekday().num_days_from_monday().into());
                Ok(local_day_bounds(monday, monday + Duration::days(7), offset))
            }
            Window::CalendarMonth { year, month } => {
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
                    AggregateError::InvalidWindow(format!("no such month {year}-{month}"))
                })?;
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(|| {
                    AggregateError::InvalidWindow(format!("no such month {year}-{month}"))
                })?;
                Ok(local_day_bounds(start, end, offset))
            }
            Window::CalendarYear { year } => {
                let start = NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| AggregateError::InvalidWindow(format!("no such year {year}")))?;
                let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
                    .ok_or_else(|| AggregateError::InvalidWindow(format!("no such year {year}")))?;
                Ok(local_day_bounds(start, end, offset))
            }
            Window::AllTime => Ok(TimeBounds::default()),
        }
    }
}

/// Totals for one local calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DayBucket {
    pub count: u32,
    pub duration_seconds: u64,
    pub distance_km: f64,
}

/// Aggregates over a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkoutAggregates {
    pub count: u32,
    pub total_duration_seconds: u64,
    pub total_distance_km: f64,
    pub count_by_kind: BTreeMap<WorkoutKind, u32>,
    /// Longest single run in the window
    pub longest_run_km: f64,
    /// Timestamp of the latest contributing workout
    pub last_workout_at: Option<DateTime<Utc>>,
    pub per_day: BTreeMap<NaiveDate, DayBucket>,
}

impl WorkoutAggregates {
    pub fn total_duration_minutes(&self) -> f64 {
        self.total_duration_seconds as f64 / 60.0
    }

    pub fn count_of(&self, kind: WorkoutKind) -> u32 {
        self.count_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Local dates with at least one qualifying workout.
    pub fn active_days(&self) -> BTreeSet<NaiveDate> {
        self.per_day.keys().copied().collect()
    }
}

/// Whether a workout qualifies under an optional kind filter.
///
/// Without a filter only training kinds qualify; asking for a kind explicitly
/// (including biometrics) selects exactly that kind.
pub fn qualifies(record: &WorkoutRecord, kind: Option<WorkoutKind>) -> bool {
    match kind {
        Some(kind) => record.kind() == kind,
        None => record.kind().is_training(),
    }
}

/// Fold workout records into aggregates.
pub fn summarize(
    records: &[WorkoutRecord],
    kind: Option<WorkoutKind>,
    offset: FixedOffset,
) -> WorkoutAggregates {
    let mut aggregates = WorkoutAggregates::default();

    for record in records.iter().filter(|r| qualifies(r, kind)) {
        let distance = record.distance_km().unwrap_or(0.0);

        aggregates.count += 1;
        aggregates.total_duration_seconds += u64::from(record.duration_seconds);
        aggregates.total_distance_km += distance;
        *aggregates.count_by_kind.entry(record.kind()).or_insert(0) += 1;

        if record.kind() == WorkoutKind::Run && distance > aggregates.longest_run_km {
            aggregates.longest_run_km = distance;
        }

        if aggregates
            .last_workout_at
            .map_or(true, |last| record.performed_at > last)
        {
            aggregates.last_workout_at = Some(record.performed_at);
        }

        let bucket = aggregates
            .per_day
            .entry(local_date(record.performed_at, offset))
            .or_default();
        bucket.count += 1;
        bucket.duration_seconds += u64::from(record.duration_seconds);
        bucket.distance_km += distance;
    }

    aggregates
}

/// Current streak as of `today`.
///
/// A workout today extends the streak; with nothing logged today a workout
/// yesterday still keeps it alive. Any fully skipped day ends it.
pub fn current_streak(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let yesterday = today - Duration::days(1);
    let mut cursor = if active_days.contains(&today) {
        today
    } else if active_days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while active_days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

/// Longest run of consecutive active days ever.
pub fn longest_streak(active_days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in active_days {
        run = match previous {
            Some(prev) if day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }

    longest
}

/// Local calendar date of an instant.
pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// UTC instant of local midnight starting `date`.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    (date.and_time(NaiveTime::MIN) - Duration::seconds(offset.local_minus_utc().into())).and_utc()
}

fn local_day_bounds(start: NaiveDate, end: NaiveDate, offset: FixedOffset) -> TimeBounds {
    TimeBounds {
        from: Some(local_midnight(start, offset)),
        to: Some(local_midnight(end, offset)),
    }
}

/// Aggregator over a workout source.
pub struct WorkoutAggregator<'a, S: WorkoutSource + ?Sized> {
    source: &'a S,
    offset: FixedOffset,
}

impl<'a, S: WorkoutSource + ?Sized> WorkoutAggregator<'a, S> {
    /// Create an aggregator that buckets days in the given UTC offset.
    pub fn new(source: &'a S, offset: FixedOffset) -> Self {
        Self { source, offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Aggregate a user's workouts over a window.
    pub fn aggregate(
        &self,
        user_id: Uuid,
        window: &Window,
        kind: Option<WorkoutKind>,
    ) -> Result<WorkoutAggregates, AggregateError> {
        let bounds = window.bounds(self.offset)?;
        self.aggregate_bounds(user_id, bounds, kind)
    }

    /// Aggregate over already-resolved bounds.
    pub fn aggregate_bounds(
        &self,
        user_id: Uuid,
        bounds: TimeBounds,
        kind: Option<WorkoutKind>,
    ) -> Result<WorkoutAggregates, AggregateError> {
        let query = WorkoutQuery {
            from: bounds.from,
            to: bounds.to,
            kind,
        };
        let records = self.source.find_workouts(user_id, &query)?;
        Ok(summarize(&records, kind, self.offset))
    }

    /// Current streak of the user as of `now`.
    pub fn current_streak(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u32, AggregateError> {
        let today = local_date(now, self.offset);
        let bounds = TimeBounds {
            from: None,
            to: Some(local_midnight(today + Duration::days(1), self.offset)),
        };
        let days = self.aggregate_bounds(user_id, bounds, None)?.active_days();
        Ok(current_streak(&days, today))
    }

    /// Longest streak the user has ever held.
    pub fn longest_streak(&self, user_id: Uuid) -> Result<u32, AggregateError> {
        let days = self
            .aggregate_bounds(user_id, TimeBounds::default(), None)?
            .active_days();
        Ok(longest_streak(&days))
    }
}

/// Aggregation errors.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
