//! Configuration management module
//!
//! This module handles loading, saving, and resolving application settings.
//! Settings are stored in `settings.json` in the data directory with atomic
//! writes to prevent corruption.

pub mod manager;
pub mod models;

pub use manager::{SettingsManager, default_data_dir};
pub use models::AppSettings;
