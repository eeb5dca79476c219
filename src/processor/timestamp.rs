//! Timestamp parsing across the formats the sensor API has been seen to emit.
//!
//! All results are naive wall-clock times. Nothing here returns an error: a
//! value that cannot be read as a point in time yields `None` and the caller
//! drops the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

// ---

/// Known upstream formats, tried in order before the flexible fallback.
pub const KNOWN_FORMATS: &[&str] = &[
    "%d-%b-%Y %H:%M:%S",    // 21-Aug-2024 12:11:13
    "%Y-%m-%d %H:%M:%S",    // 2024-08-21 12:11:13
    "%d/%m/%Y %H:%M",       // 21/08/2024 12:11
    "%d-%m-%Y %H:%M:%S",    // 21-08-2024 12:11:13
    "%Y/%m/%d %H:%M:%S",    // 2024/08/21 12:11:13
    "%d-%m-%Y %I:%M:%S %p", // 21-08-2024 12:11:13 PM
];

/// Date-time shapes accepted by the fallback parser.
const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
];

/// Date-only shapes accepted by the fallback parser; they resolve to midnight.
const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%d/%m/%Y", "%m/%d/%Y", "%d %b %Y", "%B %d, %Y",
];

/// Parse a raw JSON timestamp value.
///
/// Strings go through [`parse_timestamp_str`]. Numbers are read as Unix epoch
/// seconds (fractional part kept). Anything else is `None`.
pub fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    // ---
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
            }
            let secs = n.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
            DateTime::from_timestamp(whole as i64, nanos).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

/// Parse a textual timestamp: known formats first, first match wins, then
/// the flexible fallback.
pub fn parse_timestamp_str(raw: &str) -> Option<NaiveDateTime> {
    // ---
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    KNOWN_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_flexible(s))
}

fn parse_flexible(s: &str) -> Option<NaiveDateTime> {
    // ---
    // Offset-carrying inputs keep the wall-clock time they were written in.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }

    FLEXIBLE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            FLEXIBLE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}
