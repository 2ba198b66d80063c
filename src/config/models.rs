//! Settings data models
//!
//! This module defines the application settings document (`settings.json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON field names of [`AppSettings`], used for case-insensitive matching on read
pub const SETTINGS_FIELDS: &[&str] = &[
    "rdpFolder",
    "theme",
    "accentColor",
    "fontSize",
    "showThumbnails",
    "recentCount",
    "startWithWindows",
    "minimizeToTray",
    "lastBackup",
    "autoBackup",
];

/// Application settings
///
/// Every field has a default, so partial or older documents load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Profile directory; relative paths resolve against the data directory
    pub rdp_folder: String,
    /// UI theme name
    pub theme: String,
    /// UI accent color name
    pub accent_color: String,
    /// UI font size name
    pub font_size: String,
    /// Whether the UI shows connection thumbnails
    pub show_thumbnails: bool,
    /// Number of entries in the recent view
    pub recent_count: usize,
    /// Whether to start at Windows login
    pub start_with_windows: bool,
    /// Whether closing the window minimizes to the tray
    pub minimize_to_tray: bool,
    /// Time of the last profile backup
    #[serde(with = "crate::profile::timestamp::lenient_option")]
    pub last_backup: Option<DateTime<Utc>>,
    /// Whether backups are taken automatically on startup
    pub auto_backup: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            rdp_folder: "profiles".to_string(),
            theme: "dark".to_string(),
            accent_color: "Blue".to_string(),
            font_size: "Medium".to_string(),
            show_thumbnails: false,
            recent_count: 10,
            start_with_windows: false,
            minimize_to_tray: true,
            last_backup: None,
            auto_backup: true,
        }
    }
}
