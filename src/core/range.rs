//! Visible range resolution.
//!
//! The timeline always shows whole months: the window runs from day 1 of
//! the month holding the earliest segment start to day 30 of the month
//! holding the latest segment end.

use super::calendar::{DayNumber, MonthMarker};
use super::segment::Segment;

/// Year shown when there is nothing to display and no campaign date is known.
pub const DEFAULT_FALLBACK_YEAR: i64 = 1027;

/// The month-snapped visible time window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub start_month: MonthMarker,
    pub end_month: MonthMarker,
    /// Day 1 of `start_month`
    pub start_day_num: DayNumber,
    /// Day 30 of `end_month`
    pub end_day_num: DayNumber,
}

impl Range {
    /// A range covering whole months from `start_month` to `end_month`.
    pub fn from_months(start_month: MonthMarker, end_month: MonthMarker) -> Self {
        Self {
            start_month,
            end_month,
            start_day_num: start_month.first_day().day_number(),
            end_day_num: end_month.last_day().day_number(),
        }
    }

    /// Months 1 through 12 of `year`.
    pub fn single_year(year: i64) -> Self {
        Self::from_months(
            MonthMarker { year, month: 1 },
            MonthMarker { year, month: 12 },
        )
    }

    /// Number of months in the range, inclusive.
    pub fn month_count(&self) -> i64 {
        self.start_month.months_until(self.end_month) + 1
    }

    /// Every month in the range, in order.
    pub fn months(&self) -> impl Iterator<Item = MonthMarker> + '_ {
        (0..self.month_count()).map(|i| self.start_month.offset(i))
    }

    pub fn contains(&self, day: DayNumber) -> bool {
        self.start_day_num <= day && day <= self.end_day_num
    }
}

/// Compute the range to display for the given segments.
///
/// With no segments the window is the single year `fallback_year`.
pub fn resolve_range(segments: &[Segment], fallback_year: i64) -> Range {
    let min_day = segments.iter().map(Segment::start_day).min();
    let max_day = segments.iter().map(Segment::end_day).max();

    match (min_day, max_day) {
        (Some(min_day), Some(max_day)) => Range::from_months(
            MonthMarker::containing(min_day),
            MonthMarker::containing(max_day),
        ),
        _ => Range::single_year(fallback_year),
    }
}
