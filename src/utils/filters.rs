use chrono::{Duration, NaiveDateTime};

use crate::core::models::{FilterSelection, FilteredMessage, RawMessage};
use crate::errors::DigestError;
use crate::timestamp::TimestampParser;

/// Message shown when a custom range is submitted without both bounds.
pub const MISSING_BOUNDS_MESSAGE: &str = "Please select a start and end time.";

/// Formats accepted for custom bounds, as produced by `datetime-local` inputs.
const CUSTOM_BOUND_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// An inclusive interval of local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, DigestError> {
        if start > end {
            return Err(DigestError::InputError(format!(
                "Start time {start} is after end time {end}."
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn last_hour(now: NaiveDateTime) -> Self {
        Self {
            start: now - Duration::hours(1),
            end: now,
        }
    }

    #[must_use]
    pub fn last_day(now: NaiveDateTime) -> Self {
        Self {
            start: now - Duration::hours(24),
            end: now,
        }
    }

    /// Turns a user's selection into concrete bounds.
    ///
    /// Presets are anchored at `now`. A custom selection with a missing bound is an
    /// input error rather than an empty range.
    pub fn resolve(selection: &FilterSelection, now: NaiveDateTime) -> Result<Self, DigestError> {
        match *selection {
            FilterSelection::Hour => Ok(Self::last_hour(now)),
            FilterSelection::Day => Ok(Self::last_day(now)),
            FilterSelection::Custom {
                start: Some(start),
                end: Some(end),
            } => Self::new(start, end),
            FilterSelection::Custom { .. } => {
                Err(DigestError::InputError(MISSING_BOUNDS_MESSAGE.to_string()))
            }
        }
    }

    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    #[must_use]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Parses one bound from a custom range picker. Blank input means "not set".
pub fn parse_custom_bound(raw: &str) -> Result<Option<NaiveDateTime>, DigestError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    CUSTOM_BOUND_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(Some)
        .ok_or_else(|| {
            DigestError::InputError(format!(
                "'{raw}' is not a date and time (expected YYYY-MM-DDTHH:MM)"
            ))
        })
}

/// Keeps the messages whose metadata parses to an instant inside `range`.
///
/// Unparseable metadata drops the message. Input order is preserved.
#[must_use]
pub fn filter_messages(
    messages: &[RawMessage],
    range: &TimeRange,
    parser: &TimestampParser,
) -> Vec<FilteredMessage> {
    messages
        .iter()
        .filter_map(|msg| {
            let timestamp = parser.parse(&msg.meta).ok()?;
            range.contains(timestamp).then(|| FilteredMessage {
                message: msg.clone(),
                timestamp,
            })
        })
        .collect()
}
