//! Timestamp parsing for bookmark and config values
//!
//! Bookmarks are persisted as strings but consumed as structured timestamps.
//! The accepted forms mirror what upstream APIs and hand-edited state files
//! actually contain: RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, or a bare
//! calendar date (interpreted as midnight UTC).

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a stored bookmark or config value into a UTC timestamp.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            Error::date_parse(value, "date has no midnight representation")
        })?;
        return Ok(Utc.from_utc_datetime(&midnight));
    }

    Err(Error::date_parse(
        value,
        "expected RFC 3339, YYYY-MM-DDTHH:MM:SS, or YYYY-MM-DD",
    ))
}
