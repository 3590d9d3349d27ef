//! Date and clock formatting in the en-US style the site has always shown.

use chrono::{DateTime, Local, TimeZone};

/// Shown for timestamps that fail to parse
pub const INVALID_DATE: &str = "Invalid Date";

/// Format an article timestamp as `Oct 16, 2026, 03:04 PM` in local time.
pub fn format_date(iso: &str) -> String {
    format_date_in(iso, &Local)
}

/// Same as [`format_date`] with an explicit time zone.
pub fn format_date_in<Tz>(iso: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match DateTime::parse_from_rfc3339(iso.trim()) {
        Ok(dt) => dt.with_timezone(tz).format("%b %-d, %Y, %I:%M %p").to_string(),
        Err(_) => INVALID_DATE.to_string(),
    }
}

/// Long date for the header clock, e.g. `Friday, October 16, 2026`
pub fn format_clock_date<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format("%A, %B %-d, %Y").to_string()
}

/// Header clock time, e.g. `3:04:05 PM`
pub fn format_clock_time<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format("%-I:%M:%S %p").to_string()
}
