//! Campaign Chronicle - A timeline of story events, NSCs and objects for tabletop campaigns.

mod core;
mod gui;

use std::path::PathBuf;

use crate::core::config::AppSettings;
use gui::CampaignChronicleApp;

/// Default window size when none was saved.
const DEFAULT_WINDOW_SIZE: (f32, f32) = (1024.0, 768.0);

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    // Optional campaign file to open instead of the bundled sample
    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);

    let settings = AppSettings::load();
    let (width, height) = settings.window_size.unwrap_or(DEFAULT_WINDOW_SIZE);
    log::info!(
        "starting with config {}",
        AppSettings::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Campaign Chronicle",
        options,
        Box::new(move |cc| Ok(Box::new(CampaignChronicleApp::new(cc, settings, initial_file)))),
    )
}
