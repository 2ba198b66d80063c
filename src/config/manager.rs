//! Settings manager for loading and saving application settings
//!
//! Settings live in `settings.json` inside the data directory
//! (%APPDATA%\RdpShelf by default) and are written atomically to prevent
//! corruption.

use crate::config::models::{AppSettings, SETTINGS_FIELDS};
use crate::error::{RdpShelfError, Result, StringError};
use crate::utils::{atomic_write, canonicalize_keys};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the data directory under %APPDATA%
pub const APP_DIR_NAME: &str = "RdpShelf";
/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "RDPSHELF_DATA_DIR";
/// File name of the settings document
pub const SETTINGS_FILE: &str = "settings.json";

/// Default data directory
///
/// `$RDPSHELF_DATA_DIR` when set, otherwise `%APPDATA%\RdpShelf`, otherwise
/// `.\RdpShelf`.
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(appdata).join(APP_DIR_NAME)
}

/// Settings manager
#[derive(Debug, Clone)]
pub struct SettingsManager {
    data_dir: PathBuf,
}

impl SettingsManager {
    /// Manage the settings document in `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the path to the settings file
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// Load settings from disk
    ///
    /// A missing file is created with defaults. A corrupt file yields
    /// defaults with a warning and is left for the next save to replace.
    pub fn load(&self) -> Result<AppSettings> {
        let path = self.settings_path();

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Settings file not found, writing defaults");
                let settings = AppSettings::default();
                self.save(&settings)?;
                return Ok(settings);
            }
            Err(e) => return Err(e.into()),
        };

        match parse_settings(&text) {
            Ok(settings) => {
                info!("Settings loaded successfully");
                Ok(settings)
            }
            Err(e) => {
                warn!("Failed to parse settings, using defaults: {}", e);
                Ok(AppSettings::default())
            }
        }
    }

    /// Save settings to disk with an atomic write
    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        atomic_write(&self.settings_path(), json.as_bytes()).map_err(|e| {
            RdpShelfError::ConfigError(StringError::new(format!(
                "Failed to save settings: {e}"
            )))
        })?;

        info!("Settings saved successfully");
        Ok(())
    }

    /// Resolved profile directory for `settings`
    ///
    /// An empty `rdpFolder` falls back to the default folder name.
    pub fn profiles_dir(&self, settings: &AppSettings) -> PathBuf {
        let folder = settings.rdp_folder.trim();
        let folder = if folder.is_empty() {
            AppSettings::default().rdp_folder
        } else {
            folder.to_string()
        };

        let folder = PathBuf::from(folder);
        if folder.is_absolute() {
            folder
        } else {
            self.data_dir.join(folder)
        }
    }
}

fn parse_settings(text: &str) -> std::result::Result<AppSettings, serde_json::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut value: serde_json::Value = serde_json::from_str(text)?;
    canonicalize_keys(&mut value, SETTINGS_FIELDS);
    serde_json::from_value(value)
}
