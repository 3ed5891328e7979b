//! Configuration and settings module.
//!
//! This module handles persistent settings including lane colors, view
//! defaults, the recent files list, and saving/loading configuration to disk.

use eframe::egui::Color32;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::calendar::{self, CalendarDate};
use super::error::AppError;
use super::mapper::{self, DEFAULT_ZOOM};
use super::range::DEFAULT_FALLBACK_YEAR;
use super::segment::SegmentKind;
use super::timeline::TimelineOptions;

/// Settings filename for persistence.
const SETTINGS_FILENAME: &str = "config.json";

/// Directory under the user's config dir.
const SETTINGS_DIR: &str = "campaign-chronicle";

/// Maximum number of recent files to track.
const MAX_RECENT_FILES: usize = 10;

/// Color settings for the timeline view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    // Lane colors
    /// Story event bars
    pub story: [u8; 3],
    /// NSC lifetime bars
    pub nsc: [u8; 3],
    /// Object lifetime bars
    pub object: [u8; 3],
    /// End-of-event markers
    pub end_marker: [u8; 3],

    // Highlight colors
    /// Reference date ("today") marker
    pub today: [u8; 3],
    /// Hovered segment outline
    pub hover: [u8; 3],

    // Background colors
    /// Main timeline background color
    pub background: [u8; 3],
    /// Month header background color
    pub header_background: [u8; 3],
    /// Lane label column background color
    pub label_background: [u8; 3],

    /// Month grid line color
    pub grid: [u8; 3],

    // Text colors
    /// Header text color
    pub text_header: [u8; 3],
    /// Label text color
    pub text_label: [u8; 3],
    /// Placeholder/inactive text color
    pub text_dim: [u8; 3],

    // Status colors
    /// Success status color
    pub status_success: [u8; 3],
    /// Error status color
    pub status_error: [u8; 3],
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            story: [100, 150, 200],     // Light blue
            nsc: [76, 175, 80],         // Green
            object: [180, 100, 220],    // Purple
            end_marker: [244, 67, 54],  // Red

            today: [255, 200, 100], // Orange/gold
            hover: [255, 255, 255], // White

            background: [30, 30, 35],        // Dark gray
            header_background: [40, 40, 45], // Slightly lighter
            label_background: [35, 35, 40],  // Between background and header

            grid: [50, 50, 55],

            text_header: [128, 128, 128], // Gray
            text_label: [211, 211, 211],  // Light gray
            text_dim: [105, 105, 105],    // Dark gray

            status_success: [76, 175, 80], // Green
            status_error: [244, 67, 54],   // Red
        }
    }
}

impl ColorSettings {
    /// Convert a color array to egui Color32.
    #[inline]
    pub fn to_color32(color: [u8; 3]) -> Color32 {
        Color32::from_rgb(color[0], color[1], color[2])
    }

    /// Convert a color array to egui Color32 with alpha.
    #[inline]
    pub fn to_color32_alpha(color: [u8; 3], alpha: u8) -> Color32 {
        Color32::from_rgba_unmultiplied(color[0], color[1], color[2], alpha)
    }

    /// Bar color for a lane.
    pub fn lane_color(&self, kind: SegmentKind) -> Color32 {
        Self::to_color32(match kind {
            SegmentKind::Story => self.story,
            SegmentKind::NscLifetime => self.nsc,
            SegmentKind::ObjectLifetime => self.object,
        })
    }

    pub fn end_marker_color(&self) -> Color32 {
        Self::to_color32(self.end_marker)
    }

    pub fn today_color(&self) -> Color32 {
        Self::to_color32(self.today)
    }

    pub fn today_color_alpha(&self, alpha: u8) -> Color32 {
        Self::to_color32_alpha(self.today, alpha)
    }

    pub fn hover_color(&self) -> Color32 {
        Self::to_color32(self.hover)
    }

    pub fn background_color(&self) -> Color32 {
        Self::to_color32(self.background)
    }

    pub fn header_background_color(&self) -> Color32 {
        Self::to_color32(self.header_background)
    }

    pub fn label_background_color(&self) -> Color32 {
        Self::to_color32(self.label_background)
    }

    pub fn grid_color(&self) -> Color32 {
        Self::to_color32(self.grid)
    }

    pub fn text_header_color(&self) -> Color32 {
        Self::to_color32(self.text_header)
    }

    pub fn text_label_color(&self) -> Color32 {
        Self::to_color32(self.text_label)
    }

    pub fn text_dim_color(&self) -> Color32 {
        Self::to_color32(self.text_dim)
    }

    pub fn status_success_color(&self) -> Color32 {
        Self::to_color32(self.status_success)
    }

    pub fn status_error_color(&self) -> Color32 {
        Self::to_color32(self.status_error)
    }
}

/// Application settings including colors and view defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Color customization settings.
    #[serde(default)]
    pub colors: ColorSettings,

    /// Zoom factor applied when a campaign is opened.
    #[serde(default = "default_zoom")]
    pub default_zoom: f32,

    /// Year shown when a campaign has no dated records.
    #[serde(default = "default_fallback_year")]
    pub fallback_year: i64,

    /// Reference date used when the campaign file does not carry one.
    #[serde(default)]
    pub reference_date: Option<CalendarDate>,

    /// Recently opened campaign files (most recent first).
    #[serde(default)]
    pub recent_files: Vec<PathBuf>,

    /// Window size to restore on startup (width, height).
    #[serde(default)]
    pub window_size: Option<(f32, f32)>,
}

fn default_zoom() -> f32 {
    DEFAULT_ZOOM
}

fn default_fallback_year() -> i64 {
    DEFAULT_FALLBACK_YEAR
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            colors: ColorSettings::default(),
            default_zoom: default_zoom(),
            fallback_year: default_fallback_year(),
            reference_date: None,
            recent_files: Vec::new(),
            window_size: None,
        }
    }
}

impl AppSettings {
    /// Get the settings file path in the user's config directory.
    fn get_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push(SETTINGS_DIR);
            path.push(SETTINGS_FILENAME);
            path
        })
    }

    /// Load settings from disk, returning defaults if loading fails.
    pub fn load() -> Self {
        match Self::get_settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from a specific file, returning defaults if loading fails.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            // First run
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("could not read settings {}: {}", path.display(), e);
                return Self::default();
            }
        };

        let settings: Self = serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring malformed settings {}: {}", path.display(), e);
            Self::default()
        });
        settings.sanitized()
    }

    /// Replace dates outside the supported year range with defaults.
    fn sanitized(mut self) -> Self {
        if !calendar::is_supported_year(self.fallback_year) {
            warn!("fallback year {} out of range, using default", self.fallback_year);
            self.fallback_year = default_fallback_year();
        }
        if self
            .reference_date
            .is_some_and(|d| CalendarDate::new(d.year, d.month, d.day).is_none())
        {
            warn!("ignoring invalid reference date in settings");
            self.reference_date = None;
        }
        self
    }

    /// Save settings to the user's config directory.
    pub fn save(&self) -> Result<(), AppError> {
        let path = Self::get_settings_path().ok_or_else(|| AppError::SettingsSaveError {
            reason: "Could not determine config directory".to_string(),
        })?;
        self.save_to(&path)
    }

    /// Save settings to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        // Ensure the parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::SettingsSaveError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| AppError::SettingsSaveError {
                reason: format!("Failed to serialize settings: {}", e),
            })?;

        std::fs::write(path, content).map_err(|e| AppError::SettingsSaveError {
            reason: format!("Failed to write settings file: {}", e),
        })
    }

    /// Reset all settings to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Add a file to the recent files list.
    ///
    /// The file is moved to the front of the list. If it already exists, it is
    /// moved to the front. The list is capped at MAX_RECENT_FILES entries.
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    /// Clear the recent files list.
    pub fn clear_recent_files(&mut self) {
        self.recent_files.clear();
    }

    /// Get the default zoom, clamped to the valid band.
    pub fn get_default_zoom(&self) -> f32 {
        mapper::clamp_zoom(self.default_zoom)
    }

    /// Set the default zoom.
    pub fn set_default_zoom(&mut self, zoom: f32) {
        self.default_zoom = mapper::clamp_zoom(zoom);
    }

    /// Set the window size.
    pub fn set_window_size(&mut self, width: f32, height: f32) {
        self.window_size = Some((width, height));
    }

    /// Timeline options seeded from these settings.
    pub fn timeline_options(&self) -> TimelineOptions {
        TimelineOptions {
            reference_date: self.reference_date,
            fallback_year: self.fallback_year,
            ..TimelineOptions::default()
        }
    }

    /// Get the config file path for display purposes.
    pub fn get_config_path() -> Option<PathBuf> {
        Self::get_settings_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapper::{MAX_ZOOM, MIN_ZOOM};

    #[test]
    fn test_color32_conversion() {
        let color = [255, 128, 64];
        assert_eq!(
            ColorSettings::to_color32(color),
            Color32::from_rgb(255, 128, 64)
        );
        assert_eq!(
            ColorSettings::to_color32_alpha(color, 100),
            Color32::from_rgba_unmultiplied(255, 128, 64, 100)
        );
    }

    #[test]
    fn test_lane_colors_are_distinct() {
        let colors = ColorSettings::default();
        let story = colors.lane_color(SegmentKind::Story);
        let nsc = colors.lane_color(SegmentKind::NscLifetime);
        let object = colors.lane_color(SegmentKind::ObjectLifetime);
        assert_ne!(story, nsc);
        assert_ne!(nsc, object);
        assert_eq!(story, Color32::from_rgb(100, 150, 200));
    }

    #[test]
    fn test_app_settings_default() {
        let settings = AppSettings::default();
        assert_eq!(settings.colors, ColorSettings::default());
        assert_eq!(settings.default_zoom, DEFAULT_ZOOM);
        assert_eq!(settings.fallback_year, 1027);
        assert!(settings.reference_date.is_none());
        assert!(settings.recent_files.is_empty());
        assert!(settings.window_size.is_none());
    }

    #[test]
    fn test_app_settings_reset() {
        let mut settings = AppSettings::default();
        settings.colors.story = [0, 0, 0];
        settings.default_zoom = 2.0;
        settings.fallback_year = 900;
        settings.recent_files.push(PathBuf::from("/test/campaign.json"));
        settings.window_size = Some((800.0, 600.0));

        settings.reset();

        assert_eq!(settings.colors.story, [100, 150, 200]);
        assert_eq!(settings.default_zoom, DEFAULT_ZOOM);
        assert_eq!(settings.fallback_year, 1027);
        assert!(settings.recent_files.is_empty());
        assert!(settings.window_size.is_none());
    }

    #[test]
    fn test_settings_with_huge_years_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "fallback_year": 100000000000000000,
                "reference_date": { "year": -100000000000000000, "month": 1, "day": 1 }
            }"#,
        )
        .unwrap();

        let settings = AppSettings::load_from(&path);
        assert_eq!(settings.fallback_year, 1027);
        assert!(settings.reference_date.is_none());
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut settings = AppSettings::default();
        settings.default_zoom = 2.5;
        settings.reference_date = CalendarDate::new(1028, 4, 12);
        settings.add_recent_file(PathBuf::from("/test/campaign.json"));
        settings.set_window_size(1024.0, 768.0);
        settings.save_to(&path).unwrap();

        let restored = AppSettings::load_from(&path);
        assert_eq!(restored.colors, settings.colors);
        assert_eq!(restored.default_zoom, 2.5);
        assert_eq!(restored.reference_date, CalendarDate::new(1028, 4, 12));
        assert_eq!(restored.recent_files.len(), 1);
        assert_eq!(restored.window_size, Some((1024.0, 768.0)));
    }

    #[test]
    fn test_load_missing_or_malformed_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = AppSettings::load_from(&dir.path().join("absent.json"));
        assert_eq!(missing.fallback_year, 1027);

        let broken = dir.path().join("config.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let settings = AppSettings::load_from(&broken);
        assert_eq!(settings.default_zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn test_recent_files_add() {
        let mut settings = AppSettings::default();

        settings.add_recent_file(PathBuf::from("/test/a.json"));
        settings.add_recent_file(PathBuf::from("/test/b.json"));
        assert_eq!(settings.recent_files[0], PathBuf::from("/test/b.json"));

        // Re-adding moves to front without duplicating
        settings.add_recent_file(PathBuf::from("/test/a.json"));
        assert_eq!(settings.recent_files.len(), 2);
        assert_eq!(settings.recent_files[0], PathBuf::from("/test/a.json"));
        assert_eq!(settings.recent_files[1], PathBuf::from("/test/b.json"));
    }

    #[test]
    fn test_recent_files_max_limit() {
        let mut settings = AppSettings::default();
        for i in 0..15 {
            settings.add_recent_file(PathBuf::from(format!("/test/campaign{}.json", i)));
        }
        assert_eq!(settings.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(
            settings.recent_files[0],
            PathBuf::from("/test/campaign14.json")
        );

        settings.clear_recent_files();
        assert!(settings.recent_files.is_empty());
    }

    #[test]
    fn test_default_zoom_clamping() {
        let mut settings = AppSettings::default();

        settings.set_default_zoom(2.0);
        assert_eq!(settings.get_default_zoom(), 2.0);

        settings.set_default_zoom(0.01);
        assert_eq!(settings.get_default_zoom(), MIN_ZOOM);

        // Hand-edited config files bypass the setter
        settings.default_zoom = 100.0;
        assert_eq!(settings.get_default_zoom(), MAX_ZOOM);
    }

    #[test]
    fn test_timeline_options_from_settings() {
        let mut settings = AppSettings::default();
        settings.fallback_year = 1030;
        settings.reference_date = CalendarDate::new(1030, 2, 2);

        let options = settings.timeline_options();
        assert_eq!(options.fallback_year, 1030);
        assert_eq!(options.reference_date, CalendarDate::new(1030, 2, 2));
        assert!(options.filter.all_visible());
    }

    #[test]
    fn test_backward_compatible_deserialization() {
        // Old config files (without newer fields) can still be loaded
        let old_json = r#"{"colors":{"story":[1,2,3]},"recent_files":["/x/campaign.json"]}"#;

        let settings: AppSettings = serde_json::from_str(old_json).unwrap();

        assert_eq!(settings.colors.story, [1, 2, 3]);
        assert_eq!(settings.colors.nsc, ColorSettings::default().nsc);
        assert_eq!(settings.default_zoom, DEFAULT_ZOOM);
        assert_eq!(settings.fallback_year, 1027);
        assert_eq!(settings.recent_files.len(), 1);
    }
}
