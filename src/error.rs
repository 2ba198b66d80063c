//! Error types for `rdpshelf`
//!
//! This module defines all error types used throughout the crate,
//! providing clear error messages and proper error propagation.
//!
//! Error variants use `#[source]` to preserve error chains so the binary can
//! print the full cause with `{:#}`.

use std::path::PathBuf;
use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for `rdpshelf`
#[derive(Debug, Error)]
pub enum RdpShelfError {
    /// No profile with the given id exists in the metadata store
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// The `.rdp` file backing a profile is missing from the profile directory
    #[error("RDP file not found: {}", .0.display())]
    RdpFileNotFound(PathBuf),

    /// A profile failed validation before being written
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Metadata was removed but the `.rdp` file could not be deleted afterwards
    #[error("Profile metadata removed but RDP file {file} could not be deleted: {source}")]
    OrphanedRdpFile {
        /// File name inside the profile directory
        file: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Launching the remote desktop client failed
    /// Preserves the underlying error source for full error chain transparency
    #[error("Failed to launch remote desktop client: {0}")]
    LaunchFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Backup creation or maintenance failed
    /// Preserves the underlying error source for full error chain transparency
    #[error("Backup error: {0}")]
    BackupError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The metadata document could not be read or moved aside, so it is not
    /// overwritten
    #[error("Profile metadata {} is unreadable and was left untouched", .0.display())]
    MetadataUnreadable(PathBuf),

    /// Atomic write could not replace the target file
    #[error("Failed to persist {}: {source}", path.display())]
    PersistFailed {
        /// Destination that was being replaced
        path: PathBuf,
        /// Underlying I/O failure from the rename
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for `rdpshelf` operations
pub type Result<T> = std::result::Result<T, RdpShelfError>;

/// Convert an error to a user-friendly message
///
/// Returns text suitable for an error dialog or the CLI's stderr, with a hint
/// on how to resolve the most common causes.
pub fn get_user_friendly_error(error: &RdpShelfError) -> String {
    match error {
        RdpShelfError::ProfileNotFound(id) => format!(
            "The profile '{id}' no longer exists.\n\n\
             It may have been deleted by another window. Refresh the profile list."
        ),
        RdpShelfError::RdpFileNotFound(path) => format!(
            "The connection file is missing:\n\n{}\n\n\
             It may have been moved or deleted outside the application.\n\
             Recreate the profile or restore the file.",
            path.display()
        ),
        RdpShelfError::InvalidProfile(reason) => {
            format!("The profile could not be saved:\n\n{reason}")
        }
        RdpShelfError::OrphanedRdpFile { file, source } => format!(
            "The profile was removed, but its connection file could not be deleted:\n\n\
             {file}: {source}\n\n\
             The file will reappear as a new profile on the next refresh."
        ),
        RdpShelfError::LaunchFailed(_) => "Unable to start Remote Desktop Connection.\n\n\
             Please ensure:\n\
             - mstsc.exe is available on this system\n\
             - The connection file is readable"
            .to_string(),
        RdpShelfError::ConfigError(_) => "Failed to load or save settings.\n\n\
             Your settings may not persist.\n\
             Check that you have write permissions to the data folder."
            .to_string(),
        RdpShelfError::BackupError(e) => format!(
            "The profile backup failed:\n\n{e}\n\n\
             Check free disk space and permissions on the data folder."
        ),
        RdpShelfError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        RdpShelfError::JsonError(e) => {
            format!(
                "A data file is corrupted:\n\n{e}\n\n\
                 The application will continue with empty data."
            )
        }
        RdpShelfError::MetadataUnreadable(path) => format!(
            "Your profile metadata could not be read:\n\n{}\n\n\
             Changes are not saved so the file is not overwritten.\n\
             Check its permissions or move it away, then restart.",
            path.display()
        ),
        RdpShelfError::PersistFailed { path, source } => format!(
            "Could not write {}:\n\n{source}\n\n\
             Another program may be holding the file open.",
            path.display()
        ),
    }
}
