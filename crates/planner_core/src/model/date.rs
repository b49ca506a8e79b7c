//! Calendar-date helpers and the injectable "today" source.
//!
//! # Invariants
//! - Only zero-padded `YYYY-MM-DD` text naming a real calendar day parses.
//! - Persisted dates always serialize back to the same canonical text.

use crate::model::validation::ValidationError;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

static CANONICAL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Parses canonical `YYYY-MM-DD` text into a calendar date.
///
/// # Errors
/// - Returns `ValidationError::InvalidDate` for non-padded, partial, or
///   impossible dates (`2024-02-30`).
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    if !CANONICAL_DATE_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, CANONICAL_DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Formats a date in canonical `YYYY-MM-DD` form.
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

/// Source of the current calendar day.
///
/// Injected into the store so `createdAt` stamps and seed dates are
/// deterministic under test.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Serde adapter keeping persisted dates in canonical text form.
pub(crate) mod canonical_date {
    use super::{format_calendar_date, parse_calendar_date};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_calendar_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_calendar_date(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{format_calendar_date, parse_calendar_date, Clock, FixedClock};
    use crate::model::validation::ValidationError;
    use chrono::NaiveDate;

    #[test]
    fn parses_canonical_dates() {
        let date = parse_calendar_date("2024-03-10").expect("canonical date should parse");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(format_calendar_date(date), "2024-03-10");
    }

    #[test]
    fn rejects_non_canonical_and_impossible_dates() {
        for raw in ["2024-3-10", "10/03/2024", "2024-02-30", "", "2024-03-10T00:00"] {
            let err = parse_calendar_date(raw).expect_err("date should be rejected");
            assert_eq!(err, ValidationError::InvalidDate(raw.to_string()));
        }
    }

    #[test]
    fn accepts_leap_day() {
        assert!(parse_calendar_date("2024-02-29").is_ok());
        assert!(parse_calendar_date("2023-02-29").is_err());
    }

    #[test]
    fn fixed_clock_returns_pinned_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(FixedClock(day).today(), day);
    }
}
