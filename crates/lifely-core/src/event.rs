//! Event types for calendar events.
//!
//! This module provides the types exchanged with the calendar API and the
//! normalized forms used for analysis:
//! - [`CalendarEvent`]: An event as returned by the Calendar API
//! - [`EventDateTime`]: A start/end value (date-only or date-time)
//! - [`Attendee`] / [`Organizer`]: People attached to an event
//! - [`NormalizedEvent`]: An event resolved into a target timezone

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// The response status for an event attendee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    /// The attendee has accepted the invitation.
    Accepted,
    /// The attendee has declined the invitation.
    Declined,
    /// The attendee has tentatively accepted.
    Tentative,
    /// The attendee has not responded.
    NeedsAction,
    /// Unknown response status.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A start or end value of a calendar event.
///
/// All-day events carry `date`; timed events carry `date_time` with an
/// optional IANA `time_zone`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// The date, in the format "yyyy-mm-dd", for all-day events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// The time, as an RFC 3339 timestamp with offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    /// The IANA timezone the time is specified in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// Creates an all-day value.
    pub fn date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// Creates a timed value.
    pub fn date_time(dt: DateTime<FixedOffset>) -> Self {
        Self {
            date_time: Some(dt),
            ..Self::default()
        }
    }

    /// Resolves the value, preferring the all-day date when both are present.
    pub fn resolve(&self) -> Option<EventTime> {
        match (self.date, self.date_time) {
            (Some(date), _) => Some(EventTime::AllDay(date)),
            (None, Some(dt)) => Some(EventTime::DateTime(dt.with_timezone(&Utc))),
            (None, None) => None,
        }
    }
}

/// An attendee of a calendar event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    /// The attendee's email address.
    #[serde(default)]
    pub email: String,
    /// The attendee's name, if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Whether this entry represents the calendar owner.
    #[serde(rename = "self", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_self: bool,
    /// The attendee's response status.
    #[serde(default)]
    pub response_status: ResponseStatus,
}

/// The organizer of a calendar event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organizer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_self: bool,
}

/// An event as returned by the Calendar API `events.list` endpoint.
///
/// Values are treated as immutable; field names follow the API so cached
/// events can be written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// Opaque event identifier.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// "confirmed", "tentative" or "cancelled".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub start: EventDateTime,
    #[serde(default)]
    pub end: EventDateTime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<Organizer>,
    /// Creation time (RFC 3339), kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Last modification time (RFC 3339), kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// For instances of recurring events, the id of the parent event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
}

impl CalendarEvent {
    /// Creates a new event with the given id and times.
    pub fn new(id: impl Into<String>, start: EventDateTime, end: EventDateTime) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            ..Self::default()
        }
    }

    /// Returns true if the event has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }

    /// Returns true if this is an instance of a recurring event.
    pub fn is_recurring_instance(&self) -> bool {
        self.recurring_event_id.is_some()
    }
}

/// An attendee after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedAttendee {
    /// Lower-cased email address.
    pub email: String,
    pub display_name: Option<String>,
    /// True if this attendee is the authenticated user.
    pub is_self: bool,
    pub response_status: ResponseStatus,
}

/// A calendar event resolved into a target timezone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Start in the target timezone.
    pub start: DateTime<Tz>,
    /// End in the target timezone.
    pub end: DateTime<Tz>,
    pub all_day: bool,
    pub duration_minutes: f64,
    pub attendees: Vec<NormalizedAttendee>,
    pub organizer_email: Option<String>,
    pub location_raw: Option<String>,
    pub created: Option<DateTime<FixedOffset>>,
    pub updated: Option<DateTime<FixedOffset>>,
    pub recurring_event_id: Option<String>,
}

impl NormalizedEvent {
    /// Duration in hours.
    pub fn hours(&self) -> f64 {
        self.duration_minutes / 60.0
    }
}
