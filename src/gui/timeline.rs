//! Timeline rendering module.
//!
//! This module draws a computed `TimelineLayout`: the month header, lane
//! labels, segment bars and the marker for the campaign's current date.
//! All geometry comes from the layout; this module only offsets it into
//! screen space and reports pointer interaction back to the caller.

use eframe::egui::{self, Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::core::calendar::{CalendarDate, DayNumber};
use crate::core::config::ColorSettings;
use crate::core::segment::SegmentRole;
use crate::core::timeline::{SegmentKey, Timeline, TimelineLayout};

/// Width of the lane label column on the left side.
pub const LABEL_WIDTH: f32 = 120.0;

/// Height of the month header.
const HEADER_HEIGHT: f32 = 20.0;

/// Month widths below this get abbreviated names.
const FULL_MONTH_NAME_WIDTH: f32 = 72.0;

/// Month widths below this get no name at all.
const MIN_LABELED_MONTH_WIDTH: f32 = 24.0;

/// Pointer interaction observed during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimelineResponse {
    /// Click position in timeline body coordinates
    pub clicked: Option<Pos2>,
    /// Day under the cursor, if the cursor is over the body
    pub hover_day: Option<DayNumber>,
    /// Width available to the body, used by fit-to-view
    pub viewport_width: f32,
}

/// Timeline renderer that draws lanes of segments over months.
pub struct TimelineRenderer<'a> {
    /// Lanes, range and reference date
    timeline: &'a Timeline,
    /// Geometry at the current zoom
    layout: &'a TimelineLayout,
    /// Colors to draw with
    colors: &'a ColorSettings,
}

impl<'a> TimelineRenderer<'a> {
    /// Create a new timeline renderer.
    pub fn new(
        timeline: &'a Timeline,
        layout: &'a TimelineLayout,
        colors: &'a ColorSettings,
    ) -> Self {
        Self {
            timeline,
            layout,
            colors,
        }
    }

    /// Render the complete timeline inside a scroll area.
    pub fn render(&self, ui: &mut egui::Ui) -> TimelineResponse {
        let viewport_width = (ui.available_width() - LABEL_WIDTH).max(0.0);

        let mut result = egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| self.render_content(ui))
            .inner;
        result.viewport_width = viewport_width;
        result
    }

    fn render_content(&self, ui: &mut egui::Ui) -> TimelineResponse {
        let body_height = self.layout.total_height().max(HEADER_HEIGHT * 2.0);
        let size = egui::vec2(
            LABEL_WIDTH + self.layout.total_width(),
            HEADER_HEIGHT + body_height,
        );
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click());
        let rect = response.rect;

        // Top-left of the timeline body (below header, right of labels)
        let origin = Pos2::new(rect.left() + LABEL_WIDTH, rect.top() + HEADER_HEIGHT);
        let body_rect = Rect::from_min_max(origin, rect.max);

        let to_body = |pos: Pos2| -> Option<Pos2> {
            body_rect
                .contains(pos)
                .then(|| Pos2::new(pos.x - origin.x, pos.y - origin.y))
        };

        let hover = response.hover_pos().and_then(to_body);
        let hovered_key = hover.and_then(|p| self.layout.hit_test(p.x, p.y));

        self.draw_background(&painter, rect);
        self.draw_month_grid(&painter, rect, origin);
        self.draw_lane_bands(&painter, rect, origin);
        self.draw_segments(&painter, body_rect, origin, hovered_key);
        self.draw_today_marker(&painter, rect, origin);
        self.draw_month_header(&painter, rect, origin);

        if self.timeline.lanes.is_empty() {
            painter.text(
                body_rect.center(),
                egui::Align2::CENTER_CENTER,
                "No dated records",
                egui::FontId::proportional(14.0),
                self.colors.text_dim_color(),
            );
        }

        let clicked = if response.clicked() {
            response.interact_pointer_pos().and_then(to_body)
        } else {
            None
        };

        TimelineResponse {
            clicked,
            hover_day: hover.map(|p| self.layout.mapper().x_to_day(p.x)),
            viewport_width: 0.0,
        }
    }

    /// Draw the background and border.
    fn draw_background(&self, painter: &Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, self.colors.background_color());
        painter.rect_stroke(
            rect,
            0.0,
            Stroke::new(1.0, Color32::DARK_GRAY),
            egui::StrokeKind::Inside,
        );
    }

    /// Indexes of the months that intersect the painter's clip rect.
    fn visible_months(&self, painter: &Painter, origin: Pos2) -> std::ops::Range<i64> {
        let clip = painter.clip_rect();
        visible_month_span(
            clip.left() - origin.x,
            clip.right() - origin.x,
            self.layout.mapper().month_width(),
            self.timeline.range.month_count(),
        )
    }

    /// Draw a vertical line at each visible month boundary.
    fn draw_month_grid(&self, painter: &Painter, rect: Rect, origin: Pos2) {
        let month_width = self.layout.mapper().month_width();
        let stroke = Stroke::new(0.5, self.colors.grid_color());
        let start_month = self.timeline.range.start_month;
        for i in self.visible_months(painter, origin) {
            let month = start_month.offset(i);
            let x = origin.x + i as f32 * month_width;
            // Heavier line at year boundaries
            let stroke = if month.month == 1 {
                Stroke::new(1.0, self.colors.text_dim_color())
            } else {
                stroke
            };
            painter.line_segment([Pos2::new(x, origin.y), Pos2::new(x, rect.bottom())], stroke);
        }
    }

    /// Draw the month header row with month names and years.
    fn draw_month_header(&self, painter: &Painter, rect: Rect, origin: Pos2) {
        let header_rect = Rect::from_min_max(
            Pos2::new(rect.left(), rect.top()),
            Pos2::new(rect.right(), origin.y),
        );
        painter.rect_filled(header_rect, 0.0, self.colors.header_background_color());

        let month_width = self.layout.mapper().month_width();
        if month_width >= MIN_LABELED_MONTH_WIDTH {
            let start_month = self.timeline.range.start_month;
            let visible = self.visible_months(painter, origin);
            let first_visible = visible.start;
            for i in visible {
                let month = start_month.offset(i);
                let name = if month_width >= FULL_MONTH_NAME_WIDTH {
                    month.name().to_string()
                } else {
                    month.name().chars().take(3).collect()
                };
                let text = if i == first_visible || month.month == 1 {
                    format!("{} {}", name, month.year)
                } else {
                    name
                };

                let x = origin.x + i as f32 * month_width;
                painter.with_clip_rect(Rect::from_min_size(
                    Pos2::new(x, rect.top()),
                    egui::vec2(month_width, HEADER_HEIGHT),
                ))
                .text(
                    Pos2::new(x + 4.0, rect.top() + HEADER_HEIGHT / 2.0),
                    egui::Align2::LEFT_CENTER,
                    text,
                    egui::FontId::proportional(10.0),
                    self.colors.text_header_color(),
                );
            }
        }

        painter.line_segment(
            [
                Pos2::new(rect.left(), origin.y),
                Pos2::new(rect.right(), origin.y),
            ],
            Stroke::new(1.0, Color32::DARK_GRAY),
        );
    }

    /// Draw the lane label column and separators between lanes.
    fn draw_lane_bands(&self, painter: &Painter, rect: Rect, origin: Pos2) {
        let label_rect = Rect::from_min_max(
            Pos2::new(rect.left(), origin.y),
            Pos2::new(origin.x, rect.bottom()),
        );
        painter.rect_filled(label_rect, 0.0, self.colors.label_background_color());
        painter.line_segment(
            [
                Pos2::new(origin.x, rect.top()),
                Pos2::new(origin.x, rect.bottom()),
            ],
            Stroke::new(1.0, Color32::DARK_GRAY),
        );

        for (i, band) in self.layout.bands().iter().enumerate() {
            let top = origin.y + band.top;
            let center_y = top + band.height / 2.0;

            let indicator_rect = Rect::from_min_size(
                Pos2::new(rect.left() + 4.0, center_y - 4.0),
                egui::vec2(8.0, 8.0),
            );
            painter.rect_filled(indicator_rect, 2.0, self.colors.lane_color(band.kind));

            painter.text(
                Pos2::new(rect.left() + 16.0, center_y),
                egui::Align2::LEFT_CENTER,
                &band.name,
                egui::FontId::proportional(12.0),
                self.colors.text_label_color(),
            );

            if i > 0 {
                painter.line_segment(
                    [Pos2::new(rect.left(), top - 4.0), Pos2::new(rect.right(), top - 4.0)],
                    Stroke::new(0.5, self.colors.grid_color()),
                );
            }
        }
    }

    /// Draw every placed segment as a labeled bar.
    fn draw_segments(
        &self,
        painter: &Painter,
        body_rect: Rect,
        origin: Pos2,
        hovered: Option<SegmentKey>,
    ) {
        let painter = painter.with_clip_rect(body_rect);
        let clip = painter.clip_rect();

        for placed in self.layout.placed() {
            let left = origin.x + placed.x;
            if left > clip.right() || left + placed.width < clip.left() {
                continue;
            }
            let Some(segment) = self.timeline.segment(placed.key) else {
                continue;
            };

            let bar = Rect::from_min_size(
                origin + Vec2::new(placed.x, placed.y),
                Vec2::new(placed.width, placed.height),
            );

            let lane_color = self.colors.lane_color(placed.kind);
            let fill = match segment.meta.role {
                SegmentRole::Span => lane_color,
                SegmentRole::EndMarker => self.colors.end_marker_color(),
                SegmentRole::Lifetime { active: true } => lane_color,
                SegmentRole::Lifetime { active: false } => lane_color.gamma_multiply(0.6),
            };
            painter.rect_filled(bar, 3.0, fill);

            if hovered == Some(placed.key) {
                painter.rect_stroke(
                    bar,
                    3.0,
                    Stroke::new(1.5, self.colors.hover_color()),
                    egui::StrokeKind::Outside,
                );
            }

            painter.with_clip_rect(bar.intersect(body_rect)).text(
                Pos2::new(bar.left() + 4.0, bar.center().y),
                egui::Align2::LEFT_CENTER,
                &segment.label,
                egui::FontId::proportional(11.0),
                Color32::BLACK,
            );
        }
    }

    /// Draw the vertical marker at the campaign's current date.
    fn draw_today_marker(&self, painter: &Painter, rect: Rect, origin: Pos2) {
        let Some(today) = self.timeline.reference_date else {
            return;
        };
        let day = today.day_number();
        if !self.timeline.range.contains(day) {
            return;
        }

        let x = origin.x + self.layout.mapper().day_to_x(day);
        painter.line_segment(
            [Pos2::new(x, origin.y), Pos2::new(x, rect.bottom())],
            Stroke::new(2.0, self.colors.today_color_alpha(200)),
        );
        painter.text(
            Pos2::new(x + 3.0, origin.y + 2.0),
            egui::Align2::LEFT_TOP,
            format_today(today),
            egui::FontId::proportional(10.0),
            self.colors.today_color(),
        );
    }
}

/// Half-open range of month indexes overlapping `[left, right]`, given in
/// body coordinates and clamped to `0..month_count`.
fn visible_month_span(
    left: f32,
    right: f32,
    month_width: f32,
    month_count: i64,
) -> std::ops::Range<i64> {
    if month_width <= 0.0 || month_count <= 0 || right < left {
        return 0..0;
    }
    let clamp = |v: f32| (v as i64).clamp(0, month_count);
    clamp((left / month_width).floor())..clamp((right / month_width).floor() + 1.0)
}

/// Label shown beside the current-date marker.
fn format_today(date: CalendarDate) -> String {
    format!("Today {}. {}", date.day, date.month_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_today() {
        let date = CalendarDate::new(1027, 6, 15).unwrap();
        assert_eq!(format_today(date), "Today 15. Hesinde");
    }

    #[test]
    fn test_visible_month_span_limits_to_clip() {
        // 12.3M months, viewport showing months 10 through 14
        assert_eq!(visible_month_span(1200.0, 1700.0, 120.0, 12_300_000), 10..15);
        // Scrolled to the start, clip extends left of the body
        assert_eq!(visible_month_span(-120.0, 300.0, 120.0, 12_300_000), 0..3);
        // Clip past the end
        assert_eq!(visible_month_span(2000.0, 5000.0, 120.0, 12), 12..12);
        assert_eq!(visible_month_span(0.0, 5000.0, 120.0, 12), 0..12);
    }

    #[test]
    fn test_visible_month_span_degenerate_input() {
        assert_eq!(visible_month_span(0.0, 100.0, 0.0, 12), 0..0);
        assert_eq!(visible_month_span(0.0, 100.0, 120.0, 0), 0..0);
        assert_eq!(visible_month_span(100.0, 0.0, 120.0, 12), 0..0);
    }
}
