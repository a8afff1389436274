//! Core types: calendar events, time windows, normalization, statistics

pub mod account;
pub mod event;
pub mod normalize;
pub mod stats;
pub mod time;
pub mod tracing;

pub use account::{Calendar, UserInfo};
pub use event::{
    Attendee, CalendarEvent, EventDateTime, NormalizedAttendee, NormalizedEvent, Organizer,
    ResponseStatus,
};
pub use normalize::{DEFAULT_TIMEZONE, normalize_event, normalize_events};
pub use stats::{
    BusiestDay, FriendEvent, FriendStats, TimeStats, compute_friend_stats, compute_time_stats,
};
pub use time::{EventTime, TimeWindow};
pub use tracing::{LOG_ENV, TracingConfig, TracingError, TracingOutputFormat, init_tracing};
