//! Calendar arithmetic for the campaign calendar.
//!
//! The campaign uses a fixed calendar of 12 months with 30 days each
//! (360 days per year, no leap years). Dates are converted to a linear
//! day number so that ordering and day distances are plain integer
//! arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of months in a campaign year.
pub const MONTHS_PER_YEAR: i64 = 12;

/// Number of days in every campaign month.
pub const DAYS_PER_MONTH: i64 = 30;

/// Number of days in a campaign year.
pub const DAYS_PER_YEAR: i64 = MONTHS_PER_YEAR * DAYS_PER_MONTH;

/// Largest supported absolute year. Day numbers and month indexes of
/// dates within this bound, and differences between them, fit in an `i64`.
pub const MAX_YEAR: i64 = i64::MAX / DAYS_PER_YEAR / 2;

/// Display names for the twelve months, in order.
pub const MONTH_NAMES: [&str; 12] = [
    "Praios", "Rondra", "Efferd", "Travia", "Boron", "Hesinde", "Firun", "Tsa", "Phex", "Peraine",
    "Ingerimm", "Rahja",
];

/// A structured date in the campaign calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i64,
    /// Month of the year (1-12)
    pub month: u8,
    /// Day of the month (1-30)
    pub day: u8,
}

/// Linear day count since day 1 of month 1 of year 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayNumber(pub i64);

/// The first day of a month, used for snapping ranges and drawing headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthMarker {
    pub year: i64,
    pub month: u8,
}

/// Errors returned when parsing a date from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("expected a date like 1027-06-15 or 15.06.1027, got '{0}'")]
    Malformed(String),
    #[error("month {0} is outside 1-12")]
    MonthOutOfRange(i64),
    #[error("day {0} is outside 1-30")]
    DayOutOfRange(i64),
    #[error("year {0} is outside the supported range")]
    YearOutOfRange(i64),
}

/// Check that a year lies within [`MAX_YEAR`] of year 0.
pub fn is_supported_year(year: i64) -> bool {
    year.checked_abs().is_some_and(|y| y <= MAX_YEAR)
}

/// Convert a calendar date into its day number.
///
/// No validation is performed: out-of-range months or days produce a day
/// number that converts back to a different, well-formed date.
pub fn to_day_number(date: CalendarDate) -> DayNumber {
    DayNumber(
        date.year * DAYS_PER_YEAR
            + (i64::from(date.month) - 1) * DAYS_PER_MONTH
            + (i64::from(date.day) - 1),
    )
}

/// Convert a day number back into a calendar date.
///
/// Uses euclidean division so negative day numbers land in the correct
/// (negative) year with a non-negative remainder.
pub fn to_calendar_date(n: DayNumber) -> CalendarDate {
    let year = n.0.div_euclid(DAYS_PER_YEAR);
    let rem = n.0.rem_euclid(DAYS_PER_YEAR);
    CalendarDate {
        year,
        month: (rem / DAYS_PER_MONTH + 1) as u8,
        day: (rem % DAYS_PER_MONTH + 1) as u8,
    }
}

impl CalendarDate {
    /// Create a date, returning None if year, month or day are out of bounds.
    pub fn new(year: i64, month: u8, day: u8) -> Option<Self> {
        if !is_supported_year(year) || !(1..=12).contains(&month) || !(1..=30).contains(&day) {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// First day of the given year.
    pub fn start_of_year(year: i64) -> Self {
        Self {
            year,
            month: 1,
            day: 1,
        }
    }

    /// Day number of this date.
    pub fn day_number(self) -> DayNumber {
        to_day_number(self)
    }

    /// The date `days` days after (or before, if negative) this one.
    pub fn add_days(self, days: i64) -> Self {
        to_calendar_date(DayNumber(self.day_number().0 + days))
    }

    /// The same day of the month, `months` months later.
    pub fn add_months(self, months: i64) -> Self {
        let marker = self.month_marker().offset(months);
        Self {
            year: marker.year,
            month: marker.month,
            day: self.day,
        }
    }

    /// Signed number of days from this date to `other`.
    pub fn days_until(self, other: CalendarDate) -> i64 {
        other.day_number().0 - self.day_number().0
    }

    /// The month this date falls in.
    pub fn month_marker(self) -> MonthMarker {
        MonthMarker {
            year: self.year,
            month: self.month,
        }
    }

    /// Name of this date's month.
    pub fn month_name(self) -> &'static str {
        self.month_marker().name()
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:02}.{}", self.day, self.month, self.year)
    }
}

impl FromStr for CalendarDate {
    type Err = DateParseError;

    /// Parse either `YYYY-MM-DD` or `DD.MM.YYYY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let malformed = || DateParseError::Malformed(trimmed.to_string());

        // Both forms yield [year, month, day]; rsplitn keeps a negative year's sign
        let parts: Vec<&str> = if trimmed.contains('.') {
            trimmed.split('.').rev().collect()
        } else {
            let mut parts: Vec<&str> = trimmed.rsplitn(3, '-').collect();
            parts.reverse();
            parts
        };

        let [year, month, day] = parts.as_slice() else {
            return Err(malformed());
        };

        let year: i64 = year.parse().map_err(|_| malformed())?;
        let month: i64 = month.parse().map_err(|_| malformed())?;
        let day: i64 = day.parse().map_err(|_| malformed())?;

        if !is_supported_year(year) {
            return Err(DateParseError::YearOutOfRange(year));
        }
        if !(1..=MONTHS_PER_YEAR).contains(&month) {
            return Err(DateParseError::MonthOutOfRange(month));
        }
        if !(1..=DAYS_PER_MONTH).contains(&day) {
            return Err(DateParseError::DayOutOfRange(day));
        }

        Ok(Self {
            year,
            month: month as u8,
            day: day as u8,
        })
    }
}

impl DayNumber {
    /// Calendar date for this day number.
    pub fn date(self) -> CalendarDate {
        to_calendar_date(self)
    }

    /// Zero-based day within the month (0-29).
    pub fn day_of_month_index(self) -> i64 {
        self.0.rem_euclid(DAYS_PER_MONTH)
    }
}

impl MonthMarker {
    /// Month containing the given day number.
    pub fn containing(n: DayNumber) -> Self {
        to_calendar_date(n).month_marker()
    }

    /// Months since month 1 of year 0.
    pub fn index(self) -> i64 {
        self.year * MONTHS_PER_YEAR + i64::from(self.month) - 1
    }

    fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(MONTHS_PER_YEAR),
            month: (index.rem_euclid(MONTHS_PER_YEAR) + 1) as u8,
        }
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(self, other: MonthMarker) -> i64 {
        other.index() - self.index()
    }

    /// The month `months` months after this one.
    pub fn offset(self, months: i64) -> Self {
        Self::from_index(self.index() + months)
    }

    /// Day 1 of this month.
    pub fn first_day(self) -> CalendarDate {
        CalendarDate {
            year: self.year,
            month: self.month,
            day: 1,
        }
    }

    /// Day 30 of this month.
    pub fn last_day(self) -> CalendarDate {
        CalendarDate {
            year: self.year,
            month: self.month,
            day: DAYS_PER_MONTH as u8,
        }
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[usize::from(self.month.clamp(1, 12)) - 1]
    }
}
