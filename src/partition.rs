//! Monthly sheet key and display timestamp generation
//!
//! Both values are derived from the wall-clock time at request arrival,
//! never from request content. Neither uses zero padding: May 2024 maps to
//! the key `2024-5`, and 9:05 on the 3rd renders as `2024/5/3 9:5`.

use chrono::{DateTime, Datelike, TimeZone, Timelike};

/// Sheet key for the calendar month containing `at`.
///
/// Format: `{year}-{month}` with a 1-based, unpadded month.
pub fn month_key<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!("{}-{}", at.year(), at.month())
}

/// Human-readable timestamp written into the first column of a row.
///
/// Format: `{year}/{month}/{day} {hour}:{minute}`, unpadded, seconds dropped.
pub fn display_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!(
        "{}/{}/{} {}:{}",
        at.year(),
        at.month(),
        at.day(),
        at.hour(),
        at.minute()
    )
}
