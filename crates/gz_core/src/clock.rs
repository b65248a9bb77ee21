//! crates/gz_core/src/clock.rs
//! Day stamps and injectable clocks.
//!
//! Business logic never reads wall-clock time directly: operations take a
//! [`Clock`] so tests can pin or advance "today" and drive multi-day rotation
//! progress deterministically.

use core::fmt;
use core::str::FromStr;

use chrono::{Datelike as _, Duration, NaiveDate};

use crate::errors::CoreError;

/// A calendar day, the granularity every record in the engine is keyed on.
/// Wire form is `"YYYY-MM-DD"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayStamp(NaiveDate);

impl DayStamp {
    #[inline]
    pub fn new(date: NaiveDate) -> Self {
        DayStamp(date)
    }

    /// Builds a day stamp from calendar components.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, CoreError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(DayStamp)
            .ok_or(CoreError::InvalidDay)
    }

    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    #[inline]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// The stamp `days` later (or earlier for negative values).
    #[inline]
    pub fn plus_days(&self, days: i64) -> Self {
        DayStamp(self.0 + Duration::days(days))
    }

    /// Whole days from `earlier` to `self` (negative if `self` is earlier).
    #[inline]
    pub fn days_since(&self, earlier: DayStamp) -> i64 {
        self.0.signed_duration_since(earlier.0).num_days()
    }
}

impl fmt::Display for DayStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayStamp {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(DayStamp)
            .map_err(|_| CoreError::InvalidDay)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DayStamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DayStamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| D::Error::custom(format!("invalid day stamp: {s}")))
    }
}

/// Source of "today". The engine only ever asks for the current day.
pub trait Clock {
    fn today(&self) -> DayStamp;
}

/// Production clock: the current UTC calendar day.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DayStamp {
        DayStamp(chrono::Utc::now().date_naive())
    }
}

/// Test clock pinned to one day; advance it to simulate rotation progress.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    day: DayStamp,
}

impl FixedClock {
    #[inline]
    pub fn at(day: DayStamp) -> Self {
        FixedClock { day }
    }

    #[inline]
    pub fn set(&mut self, day: DayStamp) {
        self.day = day;
    }

    #[inline]
    pub fn advance(&mut self, days: i64) {
        self.day = self.day.plus_days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DayStamp {
        self.day
    }
}

// === Tests ===

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_round_trip() {
        let d: DayStamp = "2025-03-09".parse().unwrap();
        assert_eq!(d.to_string(), "2025-03-09");
        assert_eq!(d, DayStamp::from_ymd(2025, 3, 9).unwrap());
        assert!("2025-13-01".parse::<DayStamp>().is_err());
        assert!("not-a-day".parse::<DayStamp>().is_err());
    }

    #[test]
    fn day_arithmetic() {
        let start: DayStamp = "2025-02-27".parse().unwrap();
        let later = start.plus_days(3);
        assert_eq!(later.to_string(), "2025-03-02"); // leap-year aware
        assert_eq!(later.days_since(start), 3);
        assert_eq!(start.days_since(later), -3);
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = FixedClock::at("2025-06-01".parse().unwrap());
        assert_eq!(clock.today().to_string(), "2025-06-01");
        clock.advance(2);
        assert_eq!(clock.today().to_string(), "2025-06-03");
        clock.set("2025-07-15".parse().unwrap());
        assert_eq!(clock.today().to_string(), "2025-07-15");
    }
}
