//! Term syntaxes for the time and date filter dimensions.
//!
//! A time term is a clock window `H:MM-H:MM` evaluated against the event's
//! local clock; a date term is an absolute window of epoch milliseconds
//! `<start>-<end>`. Both bounds are inclusive.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::models::WorkshopRecord;

// =============================================================================
// CLOCK WINDOW
// =============================================================================

/// Time-of-day window in fractional hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockWindow {
    /// Lower bound, e.g. 9.5 for 9:30.
    pub from_hours: f64,
    /// Upper bound.
    pub to_hours: f64,
}

impl ClockWindow {
    /// Whether the record starts no earlier than the lower bound and ends no
    /// later than the upper bound, both on the record's local clock.
    pub fn contains(&self, record: &WorkshopRecord) -> bool {
        clock_hours(&record.start) >= self.from_hours && clock_hours(&record.end) <= self.to_hours
    }
}

/// Hours past local midnight, minute resolution.
pub fn clock_hours(dt: &DateTime<FixedOffset>) -> f64 {
    dt.hour() as f64 + dt.minute() as f64 / 60.0
}

/// Leading integer of `s` after optional whitespace and sign; trailing text is
/// ignored, so `"00 AND 9"` reads as 0.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// First two pieces of `s` split on `-`; anything after a second `-` is ignored.
fn window_bounds(s: &str) -> Option<(&str, &str)> {
    let mut parts = s.split('-');
    Some((parts.next()?, parts.next()?))
}

fn parse_clock_time(s: &str) -> Result<f64, ParseError> {
    let mut parts = s.split(':');
    let hours = parts.next().and_then(leading_int);
    let minutes = parts.next().and_then(leading_int);
    match (hours, minutes) {
        (Some(hours), Some(minutes)) => Ok(hours as f64 + minutes as f64 / 60.0),
        _ => Err(ParseError::ClockTime(s.to_string())),
    }
}

impl FromStr for ClockWindow {
    type Err = ParseError;

    /// Lenient: each side reads only its leading `H:MM`, so a piece of a
    /// mixed expression such as `12:00-18:00 AND 9:00-15:00` reads as
    /// `12:00-18:00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = window_bounds(s).ok_or_else(|| ParseError::ClockWindow(s.to_string()))?;
        Ok(Self {
            from_hours: parse_clock_time(from)?,
            to_hours: parse_clock_time(to)?,
        })
    }
}

impl fmt::Display for ClockWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_hours = |h: f64| {
            let total = (h * 60.0).round() as u32;
            format!("{}:{:02}", total / 60, total % 60)
        };
        write!(f, "{}-{}", fmt_hours(self.from_hours), fmt_hours(self.to_hours))
    }
}

// =============================================================================
// DATE WINDOW
// =============================================================================

/// Absolute window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from_ms: i64,
    pub to_ms: i64,
}

impl DateWindow {
    /// Window from midnight UTC of `from` to midnight UTC of `to`, the way a
    /// pair of date pickers produces it.
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Self {
        let midnight = |d: NaiveDate| {
            d.and_hms_opt(0, 0, 0)
                .map(|n| n.and_utc().timestamp_millis())
                .unwrap_or_default()
        };
        Self {
            from_ms: midnight(from),
            to_ms: midnight(to),
        }
    }

    /// Whether the record starts at or after the lower bound and ends at or
    /// before the upper bound.
    pub fn contains(&self, record: &WorkshopRecord) -> bool {
        record.start.timestamp_millis() >= self.from_ms
            && record.end.timestamp_millis() <= self.to_ms
    }
}

impl FromStr for DateWindow {
    type Err = ParseError;

    /// Lenient in the same way as [`ClockWindow`]: the leading number of each
    /// side of the first `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::DateWindow(s.to_string());
        let (from, to) = window_bounds(s).ok_or_else(err)?;
        Ok(Self {
            from_ms: leading_int(from).ok_or_else(err)?,
            to_ms: leading_int(to).ok_or_else(err)?,
        })
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from_ms, self.to_ms)
    }
}
