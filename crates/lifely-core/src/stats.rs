//! Year-in-review statistics over normalized events.
//!
//! - [`compute_friend_stats`]: who the user spent the most time with
//! - [`compute_time_stats`]: how the events are distributed over the year

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Weekday};
use serde::Serialize;

use crate::event::{NormalizedEvent, ResponseStatus};

/// Email fragments that identify rooms, bots and notification senders.
const SYSTEM_EMAIL_PATTERNS: &[&str] = &[
    "@resource.calendar.google.com",
    "noreply",
    "no-reply",
    "calendar-notification",
    "@zoom.us",
    "@calendly.com",
    "mailer-daemon",
    "@google.com",
];

/// A single event shared with a friend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendEvent {
    pub id: String,
    pub summary: Option<String>,
    /// Local start date, `YYYY-MM-DD`.
    pub date: String,
    /// Duration in hours, rounded to one decimal.
    pub hours: f64,
    pub location_raw: Option<String>,
}

/// Aggregated time spent with one person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendStats {
    /// Lower-cased email, the aggregation key.
    pub email: String,
    pub display_name: Option<String>,
    pub event_count: usize,
    pub total_hours: f64,
    pub events: Vec<FriendEvent>,
}

impl FriendStats {
    /// Name to show in output: the display name, or the email's local part.
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

/// The busiest day of the year by scheduled hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusiestDay {
    /// Local date, `YYYY-MM-DD`.
    pub date: String,
    pub event_count: usize,
    pub hours: f64,
}

/// Time-based statistics for the year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub total_events: usize,
    pub total_hours: f64,
    /// Event count by month (1-12); months without events are absent.
    pub events_per_month: BTreeMap<u32, usize>,
    /// Event count by weekday abbreviation ("Mon" ... "Sun").
    pub events_per_weekday: BTreeMap<String, usize>,
    /// Hours by month (1-12).
    pub hours_per_month: BTreeMap<u32, f64>,
    pub busiest_day: Option<BusiestDay>,
}

impl TimeStats {
    /// The month with the most events, ties resolved to the earliest month.
    pub fn busiest_month(&self) -> Option<u32> {
        max_by_count(self.events_per_month.iter().map(|(m, c)| (*m, *c)))
    }

    /// The weekday with the most events.
    pub fn busiest_weekday(&self) -> Option<&str> {
        max_by_count(
            self.events_per_weekday
                .iter()
                .map(|(d, c)| (d.as_str(), *c)),
        )
    }
}

/// Computes per-person statistics.
///
/// Self, declined attendees and system accounts are skipped. People with
/// fewer than `min_events` shared events are dropped. Results are sorted by
/// event count, then total hours, both descending.
pub fn compute_friend_stats(events: &[NormalizedEvent], min_events: usize) -> Vec<FriendStats> {
    let mut by_email: HashMap<String, FriendStats> = HashMap::new();

    for event in events {
        let hours = event.hours();
        for attendee in &event.attendees {
            if attendee.is_self
                || attendee.response_status == ResponseStatus::Declined
                || is_system_email(&attendee.email)
            {
                continue;
            }

            let entry = by_email
                .entry(attendee.email.clone())
                .or_insert_with(|| FriendStats {
                    email: attendee.email.clone(),
                    display_name: None,
                    event_count: 0,
                    total_hours: 0.0,
                    events: Vec::new(),
                });

            entry.event_count += 1;
            entry.total_hours += hours;
            entry.events.push(FriendEvent {
                id: event.id.clone(),
                summary: event.summary.clone(),
                date: event.start.format("%Y-%m-%d").to_string(),
                hours: round1(hours),
                location_raw: event.location_raw.clone(),
            });
            if attendee.display_name.is_some() {
                entry.display_name = attendee.display_name.clone();
            }
        }
    }

    let mut stats: Vec<FriendStats> = by_email
        .into_values()
        .filter(|s| s.event_count >= min_events)
        .map(|mut s| {
            s.total_hours = round1(s.total_hours);
            s
        })
        .collect();

    stats.sort_by(|a, b| {
        b.event_count
            .cmp(&a.event_count)
            .then(b.total_hours.total_cmp(&a.total_hours))
            .then_with(|| a.email.cmp(&b.email))
    });
    stats
}

/// Computes the distribution of events over months, weekdays and days.
pub fn compute_time_stats(events: &[NormalizedEvent]) -> TimeStats {
    let mut events_per_month = BTreeMap::new();
    let mut hours_per_month: BTreeMap<u32, f64> = BTreeMap::new();
    let mut events_per_weekday = BTreeMap::new();
    let mut per_day: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    let mut total_hours = 0.0;

    for event in events {
        let hours = event.hours();
        let month = event.start.month();
        total_hours += hours;

        *events_per_month.entry(month).or_insert(0) += 1;
        *hours_per_month.entry(month).or_insert(0.0) += hours;
        *events_per_weekday
            .entry(weekday_abbrev(event.start.weekday()).to_string())
            .or_insert(0) += 1;

        let day = per_day
            .entry(event.start.format("%Y-%m-%d").to_string())
            .or_insert((0, 0.0));
        day.0 += 1;
        day.1 += hours;
    }

    // Strictly greater wins, so the earliest day keeps a tie.
    let mut busiest_day: Option<BusiestDay> = None;
    let mut max_hours = 0.0;
    for (date, (count, hours)) in per_day {
        if hours > max_hours {
            max_hours = hours;
            busiest_day = Some(BusiestDay {
                date,
                event_count: count,
                hours: round1(hours),
            });
        }
    }

    TimeStats {
        total_events: events.len(),
        total_hours: round1(total_hours),
        events_per_month,
        events_per_weekday,
        hours_per_month: hours_per_month
            .into_iter()
            .map(|(m, h)| (m, round1(h)))
            .collect(),
        busiest_day,
    }
}

/// Checks if an email belongs to a system or bot account.
pub fn is_system_email(email: &str) -> bool {
    let email = email.to_lowercase();
    SYSTEM_EMAIL_PATTERNS.iter().any(|p| email.contains(p))
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn max_by_count<K>(items: impl Iterator<Item = (K, usize)>) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for (key, count) in items {
        if best.as_ref().is_none_or(|(_, c)| count > *c) {
            best = Some((key, count));
        }
    }
    best.map(|(k, _)| k)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
