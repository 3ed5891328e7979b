//! Coordinate mapping between day numbers and horizontal pixel offsets.

use super::calendar::{DAYS_PER_MONTH, DayNumber, MonthMarker};
use super::range::Range;

/// Width of one month at zoom 1.0, in points.
pub const BASE_MONTH_WIDTH: f32 = 120.0;

/// Narrowest width a segment is drawn with, so every segment stays clickable.
pub const MIN_SEGMENT_WIDTH: f32 = 6.0;

/// Minimum allowed zoom factor.
pub const MIN_ZOOM: f32 = 0.4;

/// Maximum allowed zoom factor.
pub const MAX_ZOOM: f32 = 3.0;

/// Zoom factor used on startup and for invalid input.
pub const DEFAULT_ZOOM: f32 = 1.0;

/// Zoom change per zoom-in / zoom-out step.
pub const ZOOM_STEP: f32 = 0.2;

/// "Fit" makes the timeline this many times wider than the viewport.
pub const FIT_OVERSCAN: f32 = 1.2;

/// Clamp a zoom factor to the valid band. Non-finite input resets to default.
pub fn clamp_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return DEFAULT_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Width of one month at the given zoom.
pub fn month_width(zoom: f32) -> f32 {
    BASE_MONTH_WIDTH * clamp_zoom(zoom)
}

/// Horizontal offset of a day from the start of the range.
pub fn project_day(day: DayNumber, range: &Range, zoom: f32) -> f32 {
    let width = month_width(zoom);
    let months_from_start = range.start_month.months_until(MonthMarker::containing(day));
    let fractional_day = day.day_of_month_index() as f32 / DAYS_PER_MONTH as f32;
    months_from_start as f32 * width + fractional_day * width
}

/// Pixel width of a day span, never narrower than `MIN_SEGMENT_WIDTH`.
pub fn project_span(start: DayNumber, end: DayNumber, range: &Range, zoom: f32) -> f32 {
    let width = project_day(end, range, zoom) - project_day(start, range, zoom);
    width.max(MIN_SEGMENT_WIDTH)
}

/// Zoom at which the whole range is `FIT_OVERSCAN` times the viewport width.
pub fn fit_zoom(month_count: i64, viewport_width: f32) -> f32 {
    if month_count <= 0 || viewport_width.is_nan() || viewport_width <= 0.0 {
        return DEFAULT_ZOOM;
    }
    let target_width = viewport_width * FIT_OVERSCAN;
    clamp_zoom(target_width / (month_count as f32 * BASE_MONTH_WIDTH))
}

/// Range and zoom bundled for one layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    range: Range,
    zoom: f32,
}

impl CoordinateMapper {
    pub fn new(range: Range, zoom: f32) -> Self {
        Self {
            range,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn month_width(&self) -> f32 {
        month_width(self.zoom)
    }

    pub fn day_to_x(&self, day: DayNumber) -> f32 {
        project_day(day, &self.range, self.zoom)
    }

    pub fn span_to_width(&self, start: DayNumber, end: DayNumber) -> f32 {
        project_span(start, end, &self.range, self.zoom)
    }

    /// Day under a horizontal offset; the inverse of `day_to_x`, rounded down.
    pub fn x_to_day(&self, x: f32) -> DayNumber {
        let days_per_point = DAYS_PER_MONTH as f32 / self.month_width();
        let offset = (x * days_per_point).floor() as i64;
        DayNumber(self.range.start_day_num.0 + offset)
    }

    /// Total width of the whole range.
    pub fn total_width(&self) -> f32 {
        self.range.month_count() as f32 * self.month_width()
    }
}
