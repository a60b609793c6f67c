//! Epoch-millisecond helpers.
//!
//! The engine works on `i64` epoch milliseconds throughout; `chrono` is only
//! used at the edges (logs, HTTP, "now").

use chrono::{DateTime, Utc};

/// Milliseconds in one Earth day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Convert epoch milliseconds to a UTC datetime, clamping unrepresentable values to the epoch.
pub fn to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Convert a UTC datetime to epoch milliseconds.
pub fn from_datetime(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Current time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Display timestamp carried in every event payload.
///
/// Renders as a date token followed by a time token (`<t:SECS:D> <t:SECS:T>`),
/// which chat clients expand in the reader's own time zone.
pub fn display_timestamp(ms: i64) -> String {
    let secs = ms.div_euclid(1000);
    format!("<t:{secs}:D> <t:{secs}:T>")
}

/// Human-readable rendering for log lines.
pub fn describe(ms: i64) -> String {
    to_datetime(ms).format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}
