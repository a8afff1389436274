//! CalendarEvent to NormalizedEvent conversion pipeline.
//!
//! The normalization process:
//! 1. Drops cancelled events and events without a usable start/end
//! 2. Resolves start/end into the target timezone (all-day dates become local midnight)
//! 3. Lower-cases attendee emails and detects the authenticated user
//! 4. Parses creation/modification timestamps leniently

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use tracing::{debug, trace};

use crate::event::{Attendee, CalendarEvent, NormalizedAttendee, NormalizedEvent};

/// Timezone used when none is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Converts raw API events into [`NormalizedEvent`]s.
///
/// Events that cannot be normalized are skipped; input order is preserved.
pub fn normalize_events(raw: &[CalendarEvent], user_email: &str, tz: Tz) -> Vec<NormalizedEvent> {
    let user_email = user_email.to_lowercase();
    let normalized: Vec<_> = raw
        .iter()
        .filter_map(|event| normalize_event(event, &user_email, tz))
        .collect();

    debug!(
        "normalized {} of {} events into {}",
        normalized.len(),
        raw.len(),
        tz
    );
    normalized
}

/// Normalizes a single event.
///
/// `user_email` must already be lower-cased. Returns `None` for cancelled
/// events and events whose start or end cannot be resolved.
pub fn normalize_event(raw: &CalendarEvent, user_email: &str, tz: Tz) -> Option<NormalizedEvent> {
    if raw.is_cancelled() {
        trace!("skipping cancelled event {}", raw.id);
        return None;
    }

    let start_time = raw.start.resolve()?;
    let end_time = raw.end.resolve()?;
    let start = start_time.in_timezone(&tz)?;
    let end = end_time.in_timezone(&tz)?;

    let duration_minutes = (end.clone() - start.clone()).num_seconds() as f64 / 60.0;

    Some(NormalizedEvent {
        id: raw.id.clone(),
        summary: raw.summary.clone(),
        description: raw.description.clone(),
        start,
        end,
        all_day: start_time.is_all_day(),
        duration_minutes,
        attendees: normalize_attendees(&raw.attendees, user_email),
        organizer_email: raw.organizer.as_ref().and_then(|o| o.email.clone()),
        location_raw: raw.location.clone(),
        created: parse_timestamp(raw.created.as_deref()),
        updated: parse_timestamp(raw.updated.as_deref()),
        recurring_event_id: raw.recurring_event_id.clone(),
    })
}

fn normalize_attendees(raw: &[Attendee], user_email: &str) -> Vec<NormalizedAttendee> {
    raw.iter()
        .map(|attendee| {
            let email = attendee.email.to_lowercase();
            // The API flag wins; fall back to comparing against the signed-in user.
            let is_self = attendee.is_self || (!email.is_empty() && email == user_email);
            NormalizedAttendee {
                email,
                display_name: attendee.display_name.clone(),
                is_self,
                response_status: attendee.response_status,
            }
        })
        .collect()
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let value = value?;
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| trace!("ignoring unparsable timestamp {:?}: {}", value, e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventDateTime, Organizer, ResponseStatus};
    use chrono::{NaiveDate, TimeZone, Timelike, Utc};

    fn timed(id: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent::new(
            id,
            EventDateTime::date_time(DateTime::parse_from_rfc3339(start).unwrap()),
            EventDateTime::date_time(DateTime::parse_from_rfc3339(end).unwrap()),
        )
    }

    #[test]
    fn timed_event_converted_to_target_zone() {
        let raw = timed("a", "2025-07-01T16:00:00Z", "2025-07-01T17:30:00Z");
        let event = normalize_event(&raw, "me@example.com", DEFAULT_TIMEZONE).unwrap();

        assert_eq!(event.start.hour(), 12); // EDT
        assert!(!event.all_day);
        assert_eq!(event.duration_minutes, 90.0);
        assert_eq!(event.hours(), 1.5);
    }

    #[test]
    fn all_day_event_starts_at_local_midnight() {
        let raw = CalendarEvent::new(
            "b",
            EventDateTime::date(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()),
            EventDateTime::date(NaiveDate::from_ymd_opt(2025, 1, 11).unwrap()),
        );
        let event = normalize_event(&raw, "me@example.com", DEFAULT_TIMEZONE).unwrap();

        assert!(event.all_day);
        assert_eq!(event.start.hour(), 0);
        assert_eq!(
            event.start.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 1, 10, 5, 0, 0).unwrap()
        );
        assert_eq!(event.duration_minutes, 24.0 * 60.0);
    }

    #[test]
    fn cancelled_and_timeless_events_are_skipped() {
        let mut cancelled = timed("c", "2025-07-01T16:00:00Z", "2025-07-01T17:00:00Z");
        cancelled.status = Some("cancelled".to_string());
        let timeless = CalendarEvent::new("d", EventDateTime::default(), EventDateTime::default());
        let ok = timed("e", "2025-07-01T16:00:00Z", "2025-07-01T17:00:00Z");

        let events = normalize_events(&[cancelled, timeless, ok], "me@example.com", Tz::UTC);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "e");
    }

    #[test]
    fn attendees_are_lowercased_and_self_detected() {
        let mut raw = timed("f", "2025-07-01T16:00:00Z", "2025-07-01T17:00:00Z");
        raw.attendees = vec![
            Attendee {
                email: "Me@Example.com".to_string(),
                ..Attendee::default()
            },
            Attendee {
                email: "Friend@Example.com".to_string(),
                display_name: Some("Friend".to_string()),
                response_status: ResponseStatus::Accepted,
                ..Attendee::default()
            },
            Attendee {
                email: "alias@example.com".to_string(),
                is_self: true,
                ..Attendee::default()
            },
        ];
        raw.organizer = Some(Organizer {
            email: Some("friend@example.com".to_string()),
            ..Organizer::default()
        });

        let events = normalize_events(&[raw], "ME@example.com", Tz::UTC);
        let attendees = &events[0].attendees;
        assert!(attendees[0].is_self);
        assert_eq!(attendees[1].email, "friend@example.com");
        assert!(!attendees[1].is_self);
        assert!(attendees[2].is_self);
        assert_eq!(events[0].organizer_email.as_deref(), Some("friend@example.com"));
    }

    #[test]
    fn timestamps_parsed_leniently() {
        let mut raw = timed("g", "2025-07-01T16:00:00Z", "2025-07-01T17:00:00Z");
        raw.created = Some("2025-01-02T10:00:00.000Z".to_string());
        raw.updated = Some("not a timestamp".to_string());

        let event = normalize_event(&raw, "", Tz::UTC).unwrap();
        assert!(event.created.is_some());
        assert!(event.updated.is_none());
    }
}
