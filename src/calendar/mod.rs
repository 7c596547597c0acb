pub mod google;
pub mod normalize;

pub use normalize::normalize;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::fmt;

/// Start or end of an event as the calendar service reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTime {
    /// Floating all-day date. End dates are exclusive.
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub summary: Option<String>,
    pub start: RawTime,
    pub end: RawTime,
}

impl RawEvent {
    /// All-day event from `start` up to, but not including, `end`.
    pub fn all_day(summary: Option<&str>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            summary: summary.map(str::to_string),
            start: RawTime::Date(start),
            end: RawTime::Date(end),
        }
    }

    pub fn timed(
        summary: Option<&str>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            summary: summary.map(str::to_string),
            start: RawTime::DateTime(start),
            end: RawTime::DateTime(end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarError {
    Unavailable(String),
    Data(String),
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::Unavailable(reason) => write!(f, "calendar unavailable: {reason}"),
            CalendarError::Data(reason) => write!(f, "calendar data error: {reason}"),
        }
    }
}

impl std::error::Error for CalendarError {}

/// Source of raw events overlapping a time window.
pub trait CalendarSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_events(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, CalendarError>;
}

/// Used when no calendar account is configured.
#[derive(Debug, Default)]
pub struct NoCalendar;

impl CalendarSource for NoCalendar {
    fn name(&self) -> &str {
        "none"
    }

    fn fetch_events(
        &self,
        _window_start: DateTime<Utc>,
        _window_end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, CalendarError> {
        Ok(Vec::new())
    }
}
