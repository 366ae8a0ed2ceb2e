//! Week key model.
//!
//! # Responsibility
//! - Map any calendar date to the Sunday that starts its week.
//! - Provide the stable `yyyy-mm-dd` partition key for weekly data.
//!
//! # Invariants
//! - A `WeekKey` always wraps a Sunday.
//! - Every day of one Sunday-to-Saturday week yields the same key.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const WEEK_KEY_FORMAT: &str = "%Y-%m-%d";
const DAYS_PER_WEEK: i64 = 7;

/// Day labels in grid column order (Sunday first).
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Partition key for weekly planner data: the Sunday starting the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// Returns the key of the week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let offset = i64::from(date.weekday().num_days_from_sunday());
        Self(date - Duration::days(offset))
    }

    /// Sunday that starts this week.
    pub fn start(self) -> NaiveDate {
        self.0
    }

    /// Saturday that ends this week.
    pub fn end(self) -> NaiveDate {
        self.0 + Duration::days(DAYS_PER_WEEK - 1)
    }

    /// Date of the given day column (0 = Sunday).
    pub fn day(self, day: u8) -> NaiveDate {
        self.0 + Duration::days(i64::from(day))
    }

    /// Shifts the key by whole weeks; negative values move backwards.
    pub fn shifted(self, weeks: i64) -> Self {
        Self(self.0 + Duration::days(weeks * DAYS_PER_WEEK))
    }

    /// Human-readable range, e.g. `2024-03-10 - 2024-03-16`.
    pub fn range_label(self) -> String {
        format!(
            "{} - {}",
            self.start().format(WEEK_KEY_FORMAT),
            self.end().format(WEEK_KEY_FORMAT)
        )
    }
}

/// Computes the week key for `date`.
pub fn week_key_of(date: NaiveDate) -> WeekKey {
    WeekKey::containing(date)
}

impl Display for WeekKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(WEEK_KEY_FORMAT))
    }
}

/// Rejected week key text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeekKeyError {
    /// Not a `yyyy-mm-dd` date.
    InvalidDate(String),
    /// A valid date that is not a Sunday.
    NotSunday(String),
}

impl Display for WeekKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => write!(f, "invalid week key `{value}`; expected yyyy-mm-dd"),
            Self::NotSunday(value) => write!(f, "week key `{value}` is not a Sunday"),
        }
    }
}

impl Error for WeekKeyError {}

impl FromStr for WeekKey {
    type Err = WeekKeyError;

    /// Parses a stored key. Only Sundays are accepted; use
    /// [`week_key_of`] to derive a key from an arbitrary date.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let date = NaiveDate::parse_from_str(trimmed, WEEK_KEY_FORMAT)
            .map_err(|_| WeekKeyError::InvalidDate(trimmed.to_string()))?;
        let key = Self::containing(date);
        if key.0 != date {
            return Err(WeekKeyError::NotSunday(trimmed.to_string()));
        }
        Ok(key)
    }
}

/// Parses a `yyyy-mm-dd` date and returns the week containing it.
pub fn week_key_for_date_str(value: &str) -> Result<WeekKey, WeekKeyError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, WEEK_KEY_FORMAT)
        .map(WeekKey::containing)
        .map_err(|_| WeekKeyError::InvalidDate(trimmed.to_string()))
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{week_key_for_date_str, week_key_of, WeekKey, WeekKeyError};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn saturday_maps_to_preceding_sunday() {
        assert_eq!(week_key_of(date(2024, 3, 16)).to_string(), "2024-03-10");
    }

    #[test]
    fn week_key_crosses_year_boundary() {
        assert_eq!(week_key_of(date(2025, 1, 2)).to_string(), "2024-12-29");
    }

    #[test]
    fn parse_rejects_non_sunday() {
        let err = "2024-03-11".parse::<WeekKey>().expect_err("monday is not a key");
        assert_eq!(err, WeekKeyError::NotSunday("2024-03-11".to_string()));
    }

    #[test]
    fn date_str_helper_accepts_any_weekday() {
        let key = week_key_for_date_str(" 2024-03-13 ").expect("wednesday should resolve");
        assert_eq!(key.to_string(), "2024-03-10");
        assert!(week_key_for_date_str("13/03/2024").is_err());
    }

    #[test]
    fn range_label_spans_sunday_to_saturday() {
        let key = week_key_of(date(2024, 3, 12));
        assert_eq!(key.range_label(), "2024-03-10 - 2024-03-16");
        assert_eq!(key.shifted(-1).to_string(), "2024-03-03");
    }
}
