//! Timestamp parsing and rendering.
//!
//! Storage keeps every instant as Unix epoch milliseconds. Reminder input
//! arrives from HTML `datetime-local` widgets (no seconds) as well as from
//! ISO-8601 serializers (with seconds, maybe fraction and offset); all of
//! them must land on the same stored instant.

use crate::model::validation::ValidationError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::borrow::Cow;

/// Seconds-less forms that still carry an offset; RFC 3339 requires seconds.
const OFFSET_REMINDER_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

const NAIVE_REMINDER_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parses a reminder timestamp into epoch milliseconds.
///
/// Values without an offset are interpreted as UTC.
pub fn parse_reminder(value: &str) -> Result<i64, ValidationError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc).timestamp_millis());
    }

    let with_offset = zulu_as_offset(trimmed);
    if let Some(parsed) = OFFSET_REMINDER_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&with_offset, format).ok())
    {
        return Ok(parsed.with_timezone(&Utc).timestamp_millis());
    }

    NAIVE_REMINDER_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
        .ok_or_else(|| {
            ValidationError::new(
                "reminder_date",
                "datetime has wrong format; use YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z]",
            )
        })
}

fn zulu_as_offset(value: &str) -> Cow<'_, str> {
    match value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        Some(head) => Cow::Owned(format!("{head}+00:00")),
        None => Cow::Borrowed(value),
    }
}

/// Converts stored epoch milliseconds back into a UTC instant.
///
/// Returns `None` for values outside chrono's representable range.
pub fn from_epoch_ms(value: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value)
}
