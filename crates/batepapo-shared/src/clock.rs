//! Wall-clock helpers.
//!
//! Heartbeats are compared as milliseconds since the Unix epoch; message
//! `time` fields are display-only `HH:MM:SS` strings in local time.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::constants::TIME_FORMAT;

/// Current time as milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a moment as the `HH:MM:SS` string carried by messages.
pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIME_FORMAT).to_string()
}

/// `format_time` applied to the local wall clock.
pub fn local_time() -> String {
    format_time(&Local::now())
}
