//! Main application state and GUI logic.
//!
//! This module defines the main application struct and implements the eframe::App trait.
//! Records are fetched from the store on a worker thread; results come back over a
//! channel stamped with the controller's load ticket so stale fetches are dropped.

use eframe::egui;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::core::calendar::CalendarDate;
use crate::core::config::AppSettings;
use crate::core::controller::{LoadTicket, RenderPhase, TimelineController};
use crate::core::error::{self, AppError};
use crate::core::record::{Record, RecordSet, STORY_EVENTS};
use crate::core::segment::{SegmentKind, SegmentMeta, SegmentRole};
use crate::core::store::{self, MemoryStore};

use super::controls::{ControlAction, ControlsRenderer};
use super::dialogs::{
    DetailWindowAction, DetailWindowRenderer, ErrorDialogAction, ErrorDialogRenderer,
    ErrorDialogState,
};
use super::timeline::{TimelineRenderer, TimelineResponse};

/// Campaign shown when no file is given on startup.
const SAMPLE_CAMPAIGN: &str = include_str!("../../assets/sample_campaign.json");

/// Application state indicating the current loading status.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum AppState {
    /// No campaign is open
    #[default]
    NoCampaign,
    /// Records are being fetched
    Loading,
    /// A campaign is open and its timeline is built
    Ready,
}

impl AppState {
    /// Returns true if toolbar and view controls should be enabled.
    pub fn controls_enabled(&self) -> bool {
        matches!(self, AppState::Ready)
    }
}

/// Kind of status message to display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusKind {
    /// Success message (shown in green)
    Success,
    /// Error message (shown in red)
    Error,
}

/// A status message with its kind and timestamp.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    /// The message text
    pub text: String,
    /// Kind of message (success/error)
    pub kind: StatusKind,
    /// When the message was created (for auto-dismiss)
    pub created_at: std::time::Instant,
}

impl StatusMessage {
    /// Create a new status message.
    pub fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
            created_at: std::time::Instant::now(),
        }
    }

    /// Duration to show status messages before auto-dismissing.
    const DISPLAY_DURATION: std::time::Duration = std::time::Duration::from_secs(5);

    /// Check if the message should still be displayed.
    pub fn is_visible(&self) -> bool {
        self.created_at.elapsed() < Self::DISPLAY_DURATION
    }
}

/// Operation to repeat when the user clicks Retry in the error dialog.
#[derive(Debug, Clone, PartialEq)]
enum RetryTarget {
    Open(PathBuf),
    Save(PathBuf),
}

/// Settings edits offered in the toolbar menu.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SettingsChange {
    DefaultZoom,
    Reset,
}

/// Main application state and GUI logic.
pub struct CampaignChronicleApp {
    /// Current application state
    state: AppState,
    /// The open campaign, shared with load workers
    store: Option<Arc<MemoryStore>>,
    /// Path of the open campaign; None for the bundled sample
    loaded_file_path: Option<PathBuf>,
    /// Whether the store has changes not yet written to disk
    unsaved_changes: bool,
    /// Timeline state and render cycle
    controller: TimelineController,
    /// Sending half handed to each load worker
    load_tx: Sender<(LoadTicket, RecordSet)>,
    /// Finished loads, possibly stale
    load_rx: Receiver<(LoadTicket, RecordSet)>,
    /// Fit to the viewport once the next load completes
    fit_pending: bool,
    /// Day under the cursor in the last frame
    hover_date: Option<CalendarDate>,
    /// Persistent settings
    settings: AppSettings,
    /// Status message to display (success/error notifications)
    status_message: Option<StatusMessage>,
    /// Modal error dialog
    error_dialog: ErrorDialogState,
    /// What Retry in the error dialog should do
    retry_target: Option<RetryTarget>,
}

impl CampaignChronicleApp {
    /// Create a new application instance.
    ///
    /// Opens `initial_file` if given, otherwise the bundled sample campaign.
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        settings: AppSettings,
        initial_file: Option<PathBuf>,
    ) -> Self {
        let (load_tx, load_rx) = mpsc::channel();
        let mut controller =
            TimelineController::new(settings.timeline_options(), settings.get_default_zoom());
        controller.set_activation_hook(|kind, meta| {
            info!(
                "opened {} details for {} {}",
                kind.lane_name(),
                meta.collection,
                meta.id.as_deref().unwrap_or("(no id)")
            );
        });

        let mut app = Self {
            state: AppState::NoCampaign,
            store: None,
            loaded_file_path: None,
            unsaved_changes: false,
            controller,
            load_tx,
            load_rx,
            fit_pending: false,
            hover_date: None,
            settings,
            status_message: None,
            error_dialog: ErrorDialogState::new(),
            retry_target: None,
        };

        match initial_file {
            Some(path) => app.load_file(path),
            None => app.load_sample(),
        }
        app
    }

    /// Open a file dialog and load the selected campaign.
    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Campaign JSON", &["json"])
            .set_title("Open Campaign")
            .pick_file()
        {
            self.load_file(path);
        }
    }

    /// Load a campaign file from the given path.
    fn load_file(&mut self, path: PathBuf) {
        match MemoryStore::load(&path) {
            Ok(store) => {
                info!("opened campaign {}", path.display());
                let record_count = store.record_count();
                self.open_store(store, Some(path.clone()));
                self.settings.add_recent_file(path.clone());
                self.persist_settings();
                self.status_message = Some(StatusMessage::new(
                    format!("Loaded: {} ({} records)", file_name(&path), record_count),
                    StatusKind::Success,
                ));
            }
            Err(e) => {
                warn!("failed to open {}: {}", path.display(), e);
                self.retry_target = Some(RetryTarget::Open(path.clone()));
                self.show_error(error::from_store_error(Some(path), &e));
            }
        }
    }

    /// Load the bundled sample campaign.
    fn load_sample(&mut self) {
        match MemoryStore::from_json_str(SAMPLE_CAMPAIGN) {
            Ok(store) => self.open_store(store, None),
            Err(e) => {
                self.retry_target = None;
                self.show_error(error::from_store_error(None, &e));
            }
        }
    }

    /// Replace the open campaign and schedule a load.
    fn open_store(&mut self, store: MemoryStore, path: Option<PathBuf>) {
        self.store = Some(Arc::new(store));
        self.loaded_file_path = path;
        self.unsaved_changes = false;
        self.fit_pending = true;
        self.controller.close_detail();
        self.controller.invalidate();
    }

    /// Write the open campaign to its file, asking for a path if it has none.
    fn save_campaign(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let path = match self.loaded_file_path.clone() {
            Some(path) => path,
            None => match rfd::FileDialog::new()
                .add_filter("Campaign JSON", &["json"])
                .set_title("Save Campaign")
                .set_file_name("campaign.json")
                .save_file()
            {
                Some(path) => path,
                None => return,
            },
        };
        self.save_to(&store, path);
    }

    fn save_to(&mut self, store: &MemoryStore, path: PathBuf) {
        match store.save(&path) {
            Ok(()) => {
                info!("saved campaign to {}", path.display());
                self.unsaved_changes = false;
                self.status_message = Some(StatusMessage::new(
                    format!("Saved: {}", file_name(&path)),
                    StatusKind::Success,
                ));
                self.settings.add_recent_file(path.clone());
                self.persist_settings();
                self.loaded_file_path = Some(path);
            }
            Err(e) => {
                warn!("failed to save {}: {}", path.display(), e);
                self.retry_target = Some(RetryTarget::Save(path.clone()));
                self.show_error(error::from_save_error(path, &e));
            }
        }
    }

    fn persist_settings(&mut self) {
        if let Err(e) = self.settings.save() {
            warn!("{}", e.brief_description());
        }
    }

    /// Show an error in the dialog and the status bar.
    fn show_error(&mut self, error: AppError) {
        self.status_message = Some(StatusMessage::new(
            error.brief_description(),
            StatusKind::Error,
        ));
        self.error_dialog.show(error);
    }

    /// Start a background load if the records changed.
    fn start_load_if_needed(&mut self, ctx: &egui::Context) {
        if !self.controller.needs_reload() {
            return;
        }
        let Some(service) = self.store.clone() else {
            return;
        };

        let ticket = self.controller.begin_load();
        self.state = AppState::Loading;

        let tx = self.load_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let records = store::fetch_record_set(service.as_ref());
            // Receiver only goes away on shutdown
            let _ = tx.send((ticket, records));
            ctx.request_repaint();
        });
    }

    /// Apply finished loads. Stale ones are rejected by the controller.
    fn poll_loads(&mut self) {
        while let Ok((ticket, records)) = self.load_rx.try_recv() {
            if self.controller.complete_load(ticket, records) {
                self.state = AppState::Ready;
            }
        }
    }

    /// Current campaign date used as the base for advancing.
    fn current_reference_date(&self) -> CalendarDate {
        advance_base(
            self.store.as_deref(),
            self.controller.options().reference_date,
            self.settings.fallback_year,
        )
    }

    /// Move the campaign's current date and reload so active lifetimes follow.
    fn set_reference_date(&mut self, date: CalendarDate) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        store.set_reference_date(date);
        self.unsaved_changes = true;
        self.controller.invalidate();
    }
}

impl eframe::App for CampaignChronicleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loads();
        self.start_load_if_needed(ctx);

        if let Some(path) = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()))
        {
            self.load_file(path);
        }

        if let Some(action) = self.handle_keyboard_shortcuts(ctx) {
            self.handle_control_action(action, None);
        }

        self.render_toolbar(ctx);
        self.render_controls(ctx);
        self.render_timeline(ctx);
        self.render_dialogs(ctx);

        match self.controller.phase() {
            RenderPhase::Rendered => self.controller.settle(),
            // Geometry changed after drawing (fit on load)
            RenderPhase::Built => ctx.request_repaint(),
            RenderPhase::Idle | RenderPhase::Loading => {}
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
                self.settings.set_window_size(rect.width(), rect.height());
            }
            self.persist_settings();
        }
    }
}

impl CampaignChronicleApp {
    /// Handle keyboard shortcuts for the view.
    ///
    /// Returns an action if a keyboard shortcut was triggered, None otherwise.
    fn handle_keyboard_shortcuts(&self, ctx: &egui::Context) -> Option<ControlAction> {
        if !self.state.controls_enabled() || self.error_dialog.has_error() {
            return None;
        }
        if ctx.wants_keyboard_input() {
            return None;
        }

        ctx.input(|i| {
            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                return Some(ControlAction::ZoomIn);
            }
            if i.key_pressed(egui::Key::Minus) {
                return Some(ControlAction::ZoomOut);
            }
            if i.key_pressed(egui::Key::F) {
                return Some(ControlAction::Fit);
            }
            if i.key_pressed(egui::Key::F5) {
                return Some(ControlAction::Reload);
            }
            None
        })
    }

    /// Render the top toolbar section.
    ///
    /// Contains file operations, recent files and the lane filter.
    fn render_toolbar(&mut self, ctx: &egui::Context) {
        let controls_enabled = self.state.controls_enabled();
        let mut action: Option<ControlAction> = None;
        let mut open_recent: Option<PathBuf> = None;
        let mut clear_recent = false;
        let mut settings_change: Option<SettingsChange> = None;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Campaign Chronicle");
                ui.separator();

                if ui.button("📂 Open").clicked() {
                    self.open_file_dialog();
                }

                ui.add_enabled_ui(!self.settings.recent_files.is_empty(), |ui| {
                    ui.menu_button("Recent", |ui| {
                        for path in &self.settings.recent_files {
                            if ui.button(path.display().to_string()).clicked() {
                                open_recent = Some(path.clone());
                                ui.close();
                            }
                        }
                        ui.separator();
                        if ui.button("Clear list").clicked() {
                            clear_recent = true;
                            ui.close();
                        }
                    });
                });

                ui.menu_button("⚙", |ui| {
                    if ui.button("Use current zoom as default").clicked() {
                        settings_change = Some(SettingsChange::DefaultZoom);
                        ui.close();
                    }
                    if ui.button("Reset settings").clicked() {
                        settings_change = Some(SettingsChange::Reset);
                        ui.close();
                    }
                });

                ui.add_enabled_ui(self.store.is_some() && self.unsaved_changes, |ui| {
                    if ui.button("💾 Save").clicked() {
                        self.save_campaign();
                    }
                });

                ui.separator();

                ui.add_enabled_ui(controls_enabled, |ui| {
                    ui.label("Lanes:");
                    let filter = self.controller.options().filter;
                    egui::ComboBox::from_id_salt("lane_filter")
                        .selected_text(filter.summary())
                        .show_ui(ui, |ui| {
                            for kind in SegmentKind::ALL {
                                let mut visible = filter.is_visible(kind);
                                if ui.checkbox(&mut visible, kind.lane_name()).changed() {
                                    action = Some(ControlAction::ToggleLane(kind));
                                }
                            }
                        });

                    if ui.button("⟳").on_hover_text("Reload (F5)").clicked() {
                        action = Some(ControlAction::Reload);
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_status_message(ui);
                });
            });
        });

        if clear_recent {
            self.settings.clear_recent_files();
            self.persist_settings();
        }
        match settings_change {
            Some(SettingsChange::DefaultZoom) => {
                self.settings.set_default_zoom(self.controller.zoom());
                self.persist_settings();
            }
            Some(SettingsChange::Reset) => {
                self.settings.reset();
                self.persist_settings();
                self.controller.set_options(self.settings.timeline_options());
                self.controller.set_zoom(self.settings.get_default_zoom());
            }
            None => {}
        }
        if let Some(path) = open_recent {
            self.load_file(path);
        }
        if let Some(action) = action {
            self.handle_control_action(action, None);
        }
    }

    /// Render the status message if one is active.
    fn render_status_message(&mut self, ui: &mut egui::Ui) {
        if self
            .status_message
            .as_ref()
            .is_some_and(|msg| !msg.is_visible())
        {
            self.status_message = None;
            return;
        }

        let msg_info = self.status_message.as_ref().map(|msg| {
            let color = match msg.kind {
                StatusKind::Success => self.settings.colors.status_success_color(),
                StatusKind::Error => self.settings.colors.status_error_color(),
            };
            (color, msg.text.clone())
        });

        if let Some((color, text)) = msg_info {
            let mut dismiss_clicked = false;

            ui.horizontal(|ui| {
                if ui.small_button("✕").clicked() {
                    dismiss_clicked = true;
                }
                ui.colored_label(color, &text);
            });

            if dismiss_clicked {
                self.status_message = None;
            }
        }
    }

    /// Render the bottom controls section.
    fn render_controls(&mut self, ctx: &egui::Context) {
        let mut action: Option<ControlAction> = None;
        let reference_date = self.controller.timeline().and_then(|t| t.reference_date);

        egui::TopBottomPanel::bottom("controls")
            .min_height(56.0)
            .show(ctx, |ui| {
                let renderer = ControlsRenderer::new(
                    self.state.controls_enabled(),
                    self.controller.zoom(),
                    reference_date,
                    self.hover_date,
                );
                action = renderer.render(ui);
            });

        if let Some(action) = action {
            self.handle_control_action(action, None);
        }
    }

    /// Handle a control action triggered by user interaction.
    ///
    /// `viewport_width` is only known while the timeline is being drawn; fit
    /// requests without it are deferred to the next frame.
    fn handle_control_action(&mut self, action: ControlAction, viewport_width: Option<f32>) {
        match action {
            ControlAction::ZoomIn => self.controller.zoom_in(),
            ControlAction::ZoomOut => self.controller.zoom_out(),
            ControlAction::SetZoom(zoom) => self.controller.set_zoom(zoom),
            ControlAction::Fit => match viewport_width {
                Some(width) => self.controller.fit(width),
                None => self.fit_pending = true,
            },
            ControlAction::ToggleLane(kind) => {
                let mut options = self.controller.options().clone();
                options.filter.toggle(kind);
                self.controller.set_options(options);
            }
            ControlAction::AdvanceDays(days) => {
                let date = self.current_reference_date().add_days(days);
                self.set_reference_date(date);
            }
            ControlAction::AdvanceMonths(months) => {
                let date = self.current_reference_date().add_months(months);
                self.set_reference_date(date);
            }
            ControlAction::Reload => self.controller.invalidate(),
        }
    }

    /// Render the center timeline section.
    fn render_timeline(&mut self, ctx: &egui::Context) {
        let mut response: Option<TimelineResponse> = None;

        egui::CentralPanel::default().show(ctx, |ui| match self.state {
            AppState::NoCampaign => self.render_no_campaign_placeholder(ui),
            AppState::Loading if self.controller.layout().is_none() => {
                self.render_loading_placeholder(ui);
            }
            // Keep showing the previous timeline while a reload is running
            AppState::Loading | AppState::Ready => {
                self.render_campaign_header(ui);
                ui.separator();
                if let (Some(timeline), Some(layout)) =
                    (self.controller.timeline(), self.controller.layout())
                {
                    let renderer =
                        TimelineRenderer::new(timeline, layout, &self.settings.colors);
                    response = Some(renderer.render(ui));
                }
            }
        });

        let Some(response) = response else {
            self.hover_date = None;
            return;
        };
        self.controller.mark_rendered();
        self.hover_date = response.hover_day.map(|d| d.date());

        if self.fit_pending && self.state == AppState::Ready {
            self.fit_pending = false;
            self.handle_control_action(ControlAction::Fit, Some(response.viewport_width));
        }

        if let Some(pos) = response.clicked {
            self.controller.activate_at(pos.x, pos.y);
        }
    }

    /// Render the file name and record summary above the timeline.
    fn render_campaign_header(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            match self.loaded_file_path {
                Some(ref path) => ui.label(format!("File: {}", file_name(path))),
                None => ui.label("Sample campaign"),
            };

            if self.unsaved_changes {
                ui.weak("(unsaved)");
            }

            if let Some(timeline) = self.controller.timeline() {
                ui.separator();
                ui.label(format!(
                    "{} segments in {} lanes | {} to {}",
                    timeline.segment_count(),
                    timeline.lanes.len(),
                    timeline.range.start_month.first_day(),
                    timeline.range.end_month.last_day()
                ));
            }

            if self.state == AppState::Loading {
                ui.spinner();
            }
        });
    }

    /// Render the placeholder view when no campaign is open.
    fn render_no_campaign_placeholder(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("📁 No Campaign Open");
            ui.add_space(10.0);
            ui.label("Drag and drop a campaign file (.json) to get started.");
            ui.label("Or use the \"Open\" button in the toolbar.");
        });
    }

    /// Render the loading placeholder view.
    fn render_loading_placeholder(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(50.0);
            ui.heading("⏳ Loading...");
            ui.add_space(20.0);
            ui.spinner();
        });
    }

    /// Render the error dialog and the segment detail window.
    fn render_dialogs(&mut self, ctx: &egui::Context) {
        let action = ErrorDialogRenderer::new(&mut self.error_dialog).render(ctx);
        match action {
            Some(ErrorDialogAction::Retry) => match self.retry_target.take() {
                Some(RetryTarget::Open(path)) => self.load_file(path),
                Some(RetryTarget::Save(path)) => {
                    if let Some(store) = self.store.clone() {
                        self.save_to(&store, path);
                    }
                }
                None => {}
            },
            Some(ErrorDialogAction::Close) => self.retry_target = None,
            None => {}
        }

        let detail_action = self
            .controller
            .detail()
            .and_then(|detail| DetailWindowRenderer::new(detail).render(ctx));
        match detail_action {
            Some(DetailWindowAction::Close) => self.controller.close_detail(),
            Some(DetailWindowAction::OpenEndedEvent(id)) => {
                let meta = SegmentMeta {
                    collection: STORY_EVENTS,
                    id: Some(id.clone()),
                    role: SegmentRole::Span,
                    record: Record::new(),
                };
                if !self.controller.activate_segment(SegmentKind::Story, &meta) {
                    self.status_message = Some(StatusMessage::new(
                        format!("Event '{}' is not on the timeline", id),
                        StatusKind::Error,
                    ));
                }
            }
            None => {}
        }
    }
}

/// Date an advance starts from. The store is read directly so that repeated
/// advances before a reload completes accumulate.
fn advance_base(
    store: Option<&MemoryStore>,
    configured: Option<CalendarDate>,
    fallback_year: i64,
) -> CalendarDate {
    store
        .and_then(MemoryStore::reference_date)
        .or(configured)
        .unwrap_or_else(|| CalendarDate::start_of_year(fallback_year))
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string())
}
