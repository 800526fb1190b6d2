use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::{
    store::TimeEvent,
    utils::time::{day_bounds, local_date},
};

/// An event as displayed: it lasts until the next event starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRow {
    pub event: TimeEvent,
    pub end: DateTime<Utc>,
}

impl TimelineRow {
    /// Never negative, even if the clock moved backwards between reading "now" and using it.
    pub fn duration(&self) -> Duration {
        clamped_duration(self.event.start, self.end)
    }
}

fn clamped_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
    (end - start).max(Duration::zero())
}

/// Orders events by start and derives each one's end: the next event's start, or `now` for
/// the most recent one. Events starting at the same instant keep their insertion order.
pub fn build_rows(events: &[TimeEvent], now: DateTime<Utc>) -> Vec<TimelineRow> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|v| v.start);

    let ends = sorted
        .iter()
        .skip(1)
        .map(|v| v.start)
        .chain(std::iter::once(now))
        .collect::<Vec<_>>();

    sorted
        .into_iter()
        .zip(ends)
        .map(|(event, end)| TimelineRow { event, end })
        .collect()
}

/// Rows whose event started on `date` in `tz`. Ends are left as computed over the whole
/// history, so the last event of a day still ends when the next day's first one starts.
pub fn rows_for_day<Tz: TimeZone>(
    rows: Vec<TimelineRow>,
    date: NaiveDate,
    tz: &Tz,
) -> Vec<TimelineRow> {
    match day_bounds(date, tz) {
        Some((start, end)) => rows
            .into_iter()
            .filter(|v| v.event.start >= start && v.event.start < end)
            .collect(),
        // Midnight doesn't exist on this day in this zone, compare calendar dates instead.
        None => rows
            .into_iter()
            .filter(|v| local_date(v.event.start, tz) == date)
            .collect(),
    }
}

/// Whole minutes between `start` and `end`, zero when `end` precedes `start`.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    clamped_duration(start, end).num_minutes()
}

pub fn format_duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("{}분", duration_minutes(start, end))
}

pub fn format_timestamp<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format("%H:%M").to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%m월 %d일").to_string()
}

pub fn format_date_time<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format("%m월 %d일 %H:%M").to_string()
}
