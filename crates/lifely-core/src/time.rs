//! Time ranges and event time parsing.
//!
//! This module provides [`TimeWindow`] for defining calendar query ranges
//! (most importantly a whole calendar year) and [`EventTime`] for the
//! resolved start/end of an event.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A resolved event start or end.
///
/// Calendar events carry either a specific datetime or a bare date
/// (all-day events).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific datetime, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Returns `true` if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns this time in the given timezone.
    ///
    /// All-day dates resolve to local midnight in `tz`.
    pub fn in_timezone<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        match self {
            Self::DateTime(dt) => Some(dt.with_timezone(tz)),
            Self::AllDay(date) => local_midnight(*date, tz),
        }
    }
}

/// A closed time range `[start, end]` in UTC used for event queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (inclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates the window covering a calendar year in the caller's local timezone.
    ///
    /// See [`TimeWindow::for_year_in`].
    pub fn for_year(year: i32) -> Option<Self> {
        Self::for_year_in(year, &Local)
    }

    /// Creates the window covering a whole calendar year in `tz`.
    ///
    /// The window runs from January 1st 00:00:00 through December 31st
    /// 23:59:59 local time, converted to UTC. Returns `None` when the year
    /// is outside the representable range.
    pub fn for_year_in<Tz: TimeZone>(year: i32, tz: &Tz) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
        let last = NaiveDate::from_ymd_opt(year, 12, 31)?.and_hms_opt(23, 59, 59)?;

        let start = resolve_local(&first, tz)?.with_timezone(&Utc);
        let end = resolve_local(&last, tz)?.with_timezone(&Utc);
        Some(Self { start, end })
    }

    /// Checks if a datetime falls within this window (both ends inclusive).
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt <= self.end
    }

    /// Formats the lower bound for a query string.
    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }

    /// Formats the upper bound for a query string.
    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

/// Midnight of `date` in `tz`.
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    resolve_local(&date.and_hms_opt(0, 0, 0)?, tz)
}

// Gaps (DST spring-forward) have no mapping; ambiguous times take the earlier instant.
fn resolve_local<Tz: TimeZone>(naive: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(naive).earliest()
}
