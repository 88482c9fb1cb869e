//! Date parsing and timestamps
//!
//! All date-bearing control fields are i64 nanoseconds since the Unix
//! epoch. Dates supplied as `YYYY-MM-DD` strings are parsed year-first
//! and normalized to midnight UTC.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Default end-of-validity sentinel for currently-active rows.
pub const DEFAULT_MAXTO: &str = "2199-12-31";

fn midnight_nanos(date: NaiveDate) -> Result<i64> {
    let midnight: NaiveDateTime = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time of day");
    midnight
        .and_utc()
        .timestamp_nanos_opt()
        .ok_or_else(|| Error::Config(format!("date '{}' out of timestamp range", date)))
}

/// Parse a `YYYY-MM-DD` date string into epoch nanoseconds at midnight UTC.
///
/// # Errors
///
/// Returns `Error::Config` if the string is not a valid year-first date
/// or falls outside the representable nanosecond range.
pub fn parse_date_nanos(date: &str) -> Result<i64> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| Error::Config(format!("invalid date '{}': {}", date, e)))?;
    midnight_nanos(parsed)
}

/// Current calendar date at midnight UTC, in epoch nanoseconds.
pub fn today_nanos() -> i64 {
    let today = chrono::Utc::now().date_naive();
    // Today is always within range; the nanosecond i64 horizon is 2262.
    midnight_nanos(today).expect("current date within timestamp range")
}
