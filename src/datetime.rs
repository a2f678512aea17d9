//! Date/time helpers.
//!
//! Timestamps are stored in SQLite as UTC text in `YYYY-MM-DD HH:MM:SS` form,
//! which sorts and compares correctly as plain strings.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Storage format for timestamps.
pub const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a stored timestamp (SQLite format or RFC3339).
pub fn parse_db_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DB_FORMAT) {
        return Some(naive.and_utc());
    }
    None
}

/// Format a timestamp for storage.
pub fn to_db_string(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

/// Longest look-back window accepted from clients, in days.
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Longest look-back window accepted from clients, in hours.
pub const MAX_WINDOW_HOURS: i64 = MAX_WINDOW_DAYS * 24;

/// The moment `delta` before `now`, saturating at the earliest representable time.
pub fn saturating_before(now: DateTime<Utc>, delta: Option<Duration>) -> DateTime<Utc> {
    delta
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// The moment `days` ago, saturating instead of overflowing.
pub fn days_before_now(days: i64) -> DateTime<Utc> {
    saturating_before(Utc::now(), Duration::try_days(days))
}

/// Storage string for the moment `hours` ago.
pub fn hours_ago(hours: i64) -> String {
    to_db_string(&saturating_before(Utc::now(), Duration::try_hours(hours)))
}

/// Storage string for the moment `days` ago.
pub fn days_ago(days: i64) -> String {
    to_db_string(&days_before_now(days))
}

/// Format a UTC timestamp in the given timezone.
///
/// Falls back to UTC when the timezone name is unknown.
pub fn format_in_timezone(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => dt.with_timezone(&tz).format(format).to_string(),
        Err(_) => dt.format(format).to_string(),
    }
}

/// `YYYYMMDD` stamp used in export filenames.
pub fn date_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d").to_string()
}
