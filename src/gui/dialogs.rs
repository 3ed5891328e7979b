//! Dialog components for the campaign timeline.
//!
//! This module provides the error dialog and the read-only detail window
//! opened when a segment is clicked.

use eframe::egui;

use crate::core::controller::DetailView;
use crate::core::error::AppError;
use crate::core::segment::{SegmentRole, event_fields};

/// Actions that can be triggered from the error dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDialogAction {
    /// User wants to retry the failed operation
    Retry,
    /// User dismissed the dialog
    Close,
}

/// State for managing the error dialog.
#[derive(Debug, Clone, Default)]
pub struct ErrorDialogState {
    /// Whether the dialog is currently open
    pub is_open: bool,
    /// The error to display, if any
    pub error: Option<AppError>,
    /// Whether the error details are expanded
    pub details_expanded: bool,
    /// Feedback message for clipboard operations
    pub clipboard_feedback: Option<ClipboardFeedback>,
}

/// Feedback for clipboard copy operation.
#[derive(Debug, Clone)]
pub struct ClipboardFeedback {
    /// Message to display
    pub message: String,
    /// When the feedback was created
    pub created_at: std::time::Instant,
}

impl ClipboardFeedback {
    /// Create a success feedback.
    pub fn copied() -> Self {
        Self {
            message: "Copied to clipboard!".to_string(),
            created_at: std::time::Instant::now(),
        }
    }

    /// Check if the feedback should still be visible (auto-dismiss after 2 seconds).
    pub fn is_visible(&self) -> bool {
        self.created_at.elapsed() < std::time::Duration::from_secs(2)
    }
}

impl ErrorDialogState {
    /// Create a new error dialog state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the error dialog with the given error.
    pub fn show(&mut self, error: AppError) {
        self.is_open = true;
        self.error = Some(error);
        self.details_expanded = false;
        self.clipboard_feedback = None;
    }

    /// Close the error dialog.
    pub fn close(&mut self) {
        self.is_open = false;
        self.error = None;
        self.details_expanded = false;
        self.clipboard_feedback = None;
    }

    /// Check if the dialog is showing an error.
    pub fn has_error(&self) -> bool {
        self.is_open && self.error.is_some()
    }
}

/// Renderer for the error dialog.
pub struct ErrorDialogRenderer<'a> {
    state: &'a mut ErrorDialogState,
}

impl<'a> ErrorDialogRenderer<'a> {
    /// Create a new error dialog renderer.
    pub fn new(state: &'a mut ErrorDialogState) -> Self {
        Self { state }
    }

    /// Render the error dialog and return the action taken.
    ///
    /// Returns `Some(action)` if the user clicked a button, `None` otherwise.
    pub fn render(&mut self, ctx: &egui::Context) -> Option<ErrorDialogAction> {
        if !self.state.is_open {
            return None;
        }
        let Some(error) = self.state.error.as_ref() else {
            return None;
        };

        let mut action: Option<ErrorDialogAction> = None;
        let mut should_close = false;

        let title = error.dialog_title();
        let brief = error.brief_description();
        let detailed = error.detailed_info();
        let supports_retry = error.supports_retry();
        let is_recoverable = error.is_recoverable();

        // Modal overlay
        let screen_rect = ctx.input(|i| i.viewport_rect());
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Background,
            egui::Id::new("error_dialog_overlay"),
        ));
        painter.rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(150));

        egui::Window::new(format!("⚠ {}", title))
            .id(egui::Id::new("error_dialog"))
            .collapsible(false)
            .resizable(true)
            .default_width(450.0)
            .min_width(350.0)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(egui::RichText::new(&brief).size(14.0));
                ui.add_space(12.0);

                let details_header = if self.state.details_expanded {
                    "▼ Details"
                } else {
                    "▶ Details"
                };

                if ui
                    .add(egui::Button::new(details_header).frame(false))
                    .clicked()
                {
                    self.state.details_expanded = !self.state.details_expanded;
                }

                if self.state.details_expanded {
                    ui.add_space(4.0);
                    egui::Frame::new()
                        .fill(egui::Color32::from_gray(30))
                        .inner_margin(8.0)
                        .corner_radius(4.0)
                        .show(ui, |ui| {
                            ui.style_mut().override_font_id = Some(egui::FontId::monospace(12.0));
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(&detailed).color(egui::Color32::LIGHT_GRAY),
                                )
                                .wrap(),
                            );
                        });
                }

                ui.add_space(12.0);

                if let Some(ref feedback) = self.state.clipboard_feedback
                    && feedback.is_visible()
                {
                    ui.colored_label(egui::Color32::from_rgb(76, 175, 80), &feedback.message);
                    ui.add_space(4.0);
                    ctx.request_repaint(); // Keep updating to check visibility
                }

                if self
                    .state
                    .clipboard_feedback
                    .as_ref()
                    .is_some_and(|f| !f.is_visible())
                {
                    self.state.clipboard_feedback = None;
                }

                ui.separator();

                ui.horizontal(|ui| {
                    if ui
                        .button("📋 Copy Error")
                        .on_hover_text("Copy error details to clipboard")
                        .clicked()
                    {
                        ui.ctx().copy_text(detailed.clone());
                        self.state.clipboard_feedback = Some(ClipboardFeedback::copied());
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if is_recoverable && ui.button("Close").clicked() {
                            should_close = true;
                            action = Some(ErrorDialogAction::Close);
                        }

                        if supports_retry
                            && ui
                                .button("🔄 Retry")
                                .on_hover_text("Try the operation again")
                                .clicked()
                        {
                            should_close = true;
                            action = Some(ErrorDialogAction::Retry);
                        }
                    });
                });

                ui.add_space(4.0);
            });

        if should_close {
            self.state.close();
        }

        action
    }
}

/// Human-readable description of a segment's role.
pub fn role_description(role: SegmentRole) -> &'static str {
    match role {
        SegmentRole::Span => "Story event",
        SegmentRole::EndMarker => "End of event",
        SegmentRole::Lifetime { active: true } => "Active",
        SegmentRole::Lifetime { active: false } => "Inactive",
    }
}

/// Render a record field value for display. Strings lose their quotes.
pub fn field_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Actions that can be triggered from the detail window.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailWindowAction {
    /// User closed the window
    Close,
    /// User asked for the event an end marker ends
    OpenEndedEvent(String),
}

/// Id of the event an end marker refers to, if any.
pub fn ended_event_id(detail: &DetailView) -> Option<String> {
    if detail.meta.role != SegmentRole::EndMarker {
        return None;
    }
    match detail.meta.record.get(event_fields::ENDS_EVENT)? {
        serde_json::Value::Null => None,
        value => Some(field_text(value)),
    }
}

/// Renderer for the read-only segment detail window.
pub struct DetailWindowRenderer<'a> {
    detail: &'a DetailView,
}

impl<'a> DetailWindowRenderer<'a> {
    pub fn new(detail: &'a DetailView) -> Self {
        Self { detail }
    }

    /// Render the window and return the action taken, if any.
    pub fn render(&self, ctx: &egui::Context) -> Option<DetailWindowAction> {
        let detail = self.detail;
        let ended_event = ended_event_id(detail);
        let mut open = true;
        let mut action: Option<DetailWindowAction> = None;

        egui::Window::new(&detail.label)
            .id(egui::Id::new("segment_detail"))
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.strong(detail.kind.lane_name());
                    ui.separator();
                    ui.label(role_description(detail.meta.role));
                });
                ui.add_space(6.0);

                egui::Grid::new("segment_detail_summary")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        ui.label("Start");
                        ui.label(detail.start.to_string());
                        ui.end_row();

                        ui.label("End");
                        ui.label(detail.end.to_string());
                        ui.end_row();

                        ui.label("Duration");
                        ui.label(format!("{} days", detail.start.days_until(detail.end) + 1));
                        ui.end_row();

                        ui.label("Collection");
                        ui.label(detail.meta.collection);
                        ui.end_row();

                        if let Some(ref id) = detail.meta.id {
                            ui.label("Id");
                            ui.label(id);
                            ui.end_row();
                        }
                    });

                ui.add_space(6.0);
                ui.collapsing("Record", |ui| {
                    egui::Grid::new("segment_detail_record")
                        .num_columns(2)
                        .striped(true)
                        .show(ui, |ui| {
                            for (field, value) in &detail.meta.record {
                                ui.monospace(field);
                                ui.label(field_text(value));
                                ui.end_row();
                            }
                        });
                });

                ui.add_space(6.0);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Close").clicked() {
                        action = Some(DetailWindowAction::Close);
                    }
                    if let Some(ref id) = ended_event
                        && ui.button("Show ended event").clicked()
                    {
                        action = Some(DetailWindowAction::OpenEndedEvent(id.clone()));
                    }
                });
            });

        if !open {
            return Some(DetailWindowAction::Close);
        }
        action
    }
}
