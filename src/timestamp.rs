//! Timestamp extraction from scraped message metadata
//!
//! Message bubbles carry metadata such as `"[11:30, 17/08/2025] John Doe:"` or
//! `"[11:30 PM, 8/17/2025] Jane:"`. The page renders local wall-clock time, so the
//! result is a [`NaiveDateTime`] with no zone attached.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::warn;

use crate::errors::DigestError;

static META_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\[(\d{1,2}):(\d{2})\s*(am|pm)?\s*,\s*(\d{1,2})([/.\-])(\d{1,2})([/.\-])(\d{4})\]",
    )
    .expect("static regex compile")
});

/// Which of the two leading date fields is the day.
///
/// The page formats dates in the viewer's locale and nothing in the string says
/// which locale that was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    /// `D/M/Y` only.
    DayFirst,
    /// `M/D/Y` only.
    MonthFirst,
    /// `D/M/Y`, unless that is not a real date and `M/D/Y` is (`8/17/2025`).
    #[default]
    PreferDayFirst,
}

impl DateOrder {
    fn resolve(self, first: u32, second: u32, year: i32) -> Option<NaiveDate> {
        let day_first = || NaiveDate::from_ymd_opt(year, second, first);
        let month_first = || NaiveDate::from_ymd_opt(year, first, second);
        match self {
            DateOrder::DayFirst => day_first(),
            DateOrder::MonthFirst => month_first(),
            DateOrder::PreferDayFirst => day_first().or_else(month_first),
        }
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateOrder::DayFirst => "day-first",
            DateOrder::MonthFirst => "month-first",
            DateOrder::PreferDayFirst => "prefer-day-first",
        })
    }
}

impl FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day-first" | "dmy" => Ok(DateOrder::DayFirst),
            "month-first" | "mdy" => Ok(DateOrder::MonthFirst),
            "prefer-day-first" | "auto" => Ok(DateOrder::PreferDayFirst),
            other => Err(format!(
                "unknown date order '{other}' (expected day-first, month-first or prefer-day-first)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Converts a clock hour to 24-hour form.
///
/// Without a marker the hour is taken as already 24-hour.
fn to_24_hour(hour: u32, meridiem: Option<Meridiem>) -> u32 {
    match meridiem {
        Some(Meridiem::Am) if hour == 12 => 0,
        Some(Meridiem::Pm) if hour < 12 => hour + 12,
        _ => hour,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampParser {
    order: DateOrder,
}

impl TimestampParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_order(order: DateOrder) -> Self {
        Self { order }
    }

    #[must_use]
    pub fn order(&self) -> DateOrder {
        self.order
    }

    /// Parses the bracketed time/date segment out of `meta`.
    ///
    /// Failures are logged and returned; this never panics and never yields a
    /// partially filled instant.
    pub fn parse(&self, meta: &str) -> Result<NaiveDateTime, DigestError> {
        self.parse_quiet(meta).inspect_err(|e| {
            warn!(meta = %meta, error = %e, "Could not parse meta string");
        })
    }

    fn parse_quiet(&self, meta: &str) -> Result<NaiveDateTime, DigestError> {
        let caps = META_TIMESTAMP_RE.captures(meta).ok_or_else(|| {
            DigestError::ParseError(format!("no [time, date] segment in {meta:?}"))
        })?;

        let field = |idx: usize| caps.get(idx).map_or("", |m| m.as_str());
        let number = |idx: usize, name: &str| {
            field(idx).parse::<u32>().map_err(|e| {
                DigestError::ParseError(format!("{name} '{}' is not a number: {e}", field(idx)))
            })
        };

        if field(5) != field(7) {
            return Err(DigestError::ParseError(format!(
                "mixed date separators in {meta:?}"
            )));
        }

        let meridiem = match field(3).to_ascii_lowercase().as_str() {
            "am" => Some(Meridiem::Am),
            "pm" => Some(Meridiem::Pm),
            _ => None,
        };
        let hour = to_24_hour(number(1, "hour")?, meridiem);
        let minute = number(2, "minute")?;
        let first = number(4, "day/month")?;
        let second = number(6, "day/month")?;
        let year = field(8).parse::<i32>().map_err(|e| {
            DigestError::ParseError(format!("year '{}' is not a number: {e}", field(8)))
        })?;

        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
            DigestError::ParseError(format!("{hour:02}:{minute:02} is not a valid time"))
        })?;
        let date = self.order.resolve(first, second, year).ok_or_else(|| {
            DigestError::ParseError(format!(
                "{first}/{second}/{year} is not a valid {} date",
                self.order
            ))
        })?;

        Ok(date.and_time(time))
    }
}

/// Parses with the default [`DateOrder`].
///
/// # Examples
///
/// ```
/// use chrono::{Datelike, Timelike};
/// use chat_digest::timestamp::parse;
///
/// let ts = parse("[11:30, 17/08/2025] John Doe:").unwrap();
/// assert_eq!((ts.day(), ts.month(), ts.year()), (17, 8, 2025));
/// assert_eq!((ts.hour(), ts.minute()), (11, 30));
/// ```
pub fn parse(meta: &str) -> Result<NaiveDateTime, DigestError> {
    TimestampParser::default().parse(meta)
}
