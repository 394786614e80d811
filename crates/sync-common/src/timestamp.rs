use std::time::SystemTime;

use chrono::{DateTime, Local};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the current local time as `YYYY-MM-DD HH:MM:SS`, the timestamp
/// format used throughout the domain log and console responses.
#[must_use]
pub fn now_string() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Render a stored `SystemTime` (e.g. a pair's last successful sync) in the
/// same format as [`now_string`].
#[must_use]
pub fn format_system_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(TIMESTAMP_FORMAT).to_string()
}
