//! `rdpshelf` - Remote Desktop connection profile manager
//!
//! Keeps a folder of `.rdp` files and a JSON metadata document
//! (`profiles.json`) in step. `ProfileManager` reconciles `.rdp` files that
//! appear in the folder into profiles, writes new `.rdp` files for profiles
//! created in the application, searches and filters them, and hands them to
//! `mstsc.exe` to connect.
//!
//! # Data directory
//!
//! ```text
//! %APPDATA%\RdpShelf\
//!   settings.json
//!   profiles.json
//!   profiles_backup_<yyyyMMdd_HHmmss>[_N].json
//!   profiles\*.rdp
//!   logs\app.log
//! ```

// Module declarations
pub mod backup;
pub mod config;
pub mod error;
pub mod launcher;
pub mod manager;
pub mod notify;
pub mod profile;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use error::{RdpShelfError, Result};
pub use manager::ProfileManager;
pub use profile::{Profile, ProfileFilter, Resolution};
