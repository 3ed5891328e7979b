//! View controls module.
//!
//! This module handles the rendering and interaction of the bottom controls
//! panel: zoom buttons and slider, fit-to-view, the campaign's current date
//! with advance buttons, and the hover date readout.

use eframe::egui;

use crate::core::calendar::CalendarDate;
use crate::core::mapper::{MAX_ZOOM, MIN_ZOOM};
use crate::core::segment::SegmentKind;

/// User actions that can be triggered from the controls panel or toolbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Zoom in by one step
    ZoomIn,
    /// Zoom out by one step
    ZoomOut,
    /// Set an exact zoom factor (from the slider)
    SetZoom(f32),
    /// Zoom so the whole range fits the viewport
    Fit,
    /// Show or hide a lane
    ToggleLane(SegmentKind),
    /// Move the campaign's current date by a number of days
    AdvanceDays(i64),
    /// Move the campaign's current date by a number of months
    AdvanceMonths(i64),
    /// Refetch records from the store
    Reload,
}

/// Renders view controls and returns any actions triggered by user interaction.
pub struct ControlsRenderer {
    /// Whether controls should be enabled
    enabled: bool,
    /// Current zoom factor
    zoom: f32,
    /// The campaign's current date, if known
    reference_date: Option<CalendarDate>,
    /// Date under the mouse cursor, if any
    hover_date: Option<CalendarDate>,
}

impl ControlsRenderer {
    /// Create a new controls renderer.
    pub fn new(
        enabled: bool,
        zoom: f32,
        reference_date: Option<CalendarDate>,
        hover_date: Option<CalendarDate>,
    ) -> Self {
        Self {
            enabled,
            zoom,
            reference_date,
            hover_date,
        }
    }

    /// Render the controls and return any triggered action.
    pub fn render(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;

        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                action = self.render_zoom_controls(ui).or(action);
                ui.separator();
                action = self.render_date_controls(ui).or(action);
            });

            ui.add_space(4.0);

            ui.horizontal(|ui| {
                self.render_hover_readout(ui);
            });
        });

        action
    }

    /// Render zoom buttons and slider.
    fn render_zoom_controls(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;

        ui.add_enabled_ui(self.enabled, |ui| {
            if ui.button("−").on_hover_text("Zoom out (-)").clicked() {
                action = Some(ControlAction::ZoomOut);
            }

            let mut zoom = self.zoom;
            let response = ui.add(
                egui::Slider::new(&mut zoom, MIN_ZOOM..=MAX_ZOOM)
                    .fixed_decimals(1)
                    .suffix("x"),
            );
            if response.changed() {
                action = Some(ControlAction::SetZoom(zoom));
            }

            if ui.button("+").on_hover_text("Zoom in (+)").clicked() {
                action = Some(ControlAction::ZoomIn);
            }
            if ui
                .button("Fit")
                .on_hover_text("Fit the whole campaign (F)")
                .clicked()
            {
                action = Some(ControlAction::Fit);
            }
        });

        action
    }

    /// Render the current campaign date with buttons to move it.
    fn render_date_controls(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;

        ui.add_enabled_ui(self.enabled, |ui| {
            if ui.button("⏪").on_hover_text("Back one month").clicked() {
                action = Some(ControlAction::AdvanceMonths(-1));
            }
            if ui.button("◀").on_hover_text("Back one day").clicked() {
                action = Some(ControlAction::AdvanceDays(-1));
            }

            match self.reference_date {
                Some(date) => ui.label(format!("Today: {} ({})", date, date.month_name())),
                None => ui.label("Today: not set"),
            };

            if ui.button("▶").on_hover_text("Forward one day").clicked() {
                action = Some(ControlAction::AdvanceDays(1));
            }
            if ui.button("⏩").on_hover_text("Forward one month").clicked() {
                action = Some(ControlAction::AdvanceMonths(1));
            }
        });

        action
    }

    /// Render the date under the cursor.
    fn render_hover_readout(&self, ui: &mut egui::Ui) {
        match self.hover_date {
            Some(date) => {
                ui.label(format!("Cursor: {} {} {}", date.day, date.month_name(), date.year));
            }
            None => {
                ui.weak("Cursor: -");
            }
        }
    }
}
