//! Profile directory access
//!
//! [`RdpDirectory`] owns the folder of `.rdp` files: scanning, reading,
//! writing and deleting them. Scanning is non-recursive.

use super::codec;
use super::models::Profile;
use crate::error::{RdpShelfError, Result};
use crate::utils::{atomic_create, atomic_write, is_already_exists};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension of Remote Desktop connection files
pub const RDP_EXTENSION: &str = "rdp";

/// Fallback base name when a profile name sanitizes to nothing
const FALLBACK_FILE_STEM: &str = "profile";

/// The folder holding one `.rdp` file per profile
#[derive(Debug, Clone)]
pub struct RdpDirectory {
    /// Directory path
    root: PathBuf,
}

impl RdpDirectory {
    /// Open the profile directory, creating it if it does not exist
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of `file_name` inside the directory
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Whether `file_name` exists in the directory
    pub fn exists(&self, file_name: &str) -> bool {
        !file_name.is_empty() && self.path_of(file_name).is_file()
    }

    /// List the `.rdp` files directly inside the directory, sorted by name
    ///
    /// Recreates the directory if it has disappeared. Never fails: a listing
    /// error is logged and produces an empty list.
    pub fn scan(&self) -> Vec<String> {
        if let Err(e) = std::fs::create_dir_all(&self.root) {
            warn!(
                "Failed to create profile directory {}: {}",
                self.root.display(),
                e
            );
            return Vec::new();
        }

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Failed to list profile directory {}: {}",
                    self.root.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut files: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| has_rdp_extension(name))
            .collect();
        files.sort();

        debug!("Found {} .rdp files in {}", files.len(), self.root.display());
        files
    }

    /// Read and decode `file_name`
    pub fn read(&self, file_name: &str) -> Result<Profile> {
        let path = self.path_of(file_name);
        if !path.is_file() {
            return Err(RdpShelfError::RdpFileNotFound(path));
        }

        let bytes = std::fs::read(&path)?;
        Ok(codec::decode_bytes(file_name, &bytes))
    }

    /// Write a new `.rdp` file for `profile`
    ///
    /// Assigns `profile.file` first when it is blank. An existing file is
    /// never replaced: that fails with [`RdpShelfError::InvalidProfile`].
    pub fn create(&self, profile: &mut Profile) -> Result<PathBuf> {
        if profile.file.trim().is_empty() {
            profile.file = generate_file_name(&profile.name);
        }

        let path = self.path_of(&profile.file);
        atomic_create(&path, codec::to_rdp_text(profile).as_bytes()).map_err(|e| {
            if is_already_exists(&e) {
                RdpShelfError::InvalidProfile(format!("{} already exists", profile.file))
            } else {
                e
            }
        })?;
        info!("Created RDP file {}", path.display());
        Ok(path)
    }

    /// Rewrite the existing `.rdp` file of `profile`
    pub fn update(&self, profile: &Profile) -> Result<PathBuf> {
        let path = self.path_of(&profile.file);
        if profile.file.is_empty() || !path.is_file() {
            return Err(RdpShelfError::RdpFileNotFound(path));
        }

        atomic_write(&path, codec::to_rdp_text(profile).as_bytes())?;
        info!("Updated RDP file {}", path.display());
        Ok(path)
    }

    /// Delete `file_name`
    ///
    /// Returns `false` without error when the file does not exist.
    pub fn delete(&self, file_name: &str) -> Result<bool> {
        if !self.exists(file_name) {
            return Ok(false);
        }

        let path = self.path_of(file_name);
        std::fs::remove_file(&path)?;
        info!("Deleted RDP file {}", path.display());
        Ok(true)
    }
}

fn has_rdp_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(RDP_EXTENSION))
}

/// Replace characters that are invalid in Windows file names
///
/// Runs of invalid characters become a single `_`, trailing dots and spaces
/// are removed, and an empty result falls back to `profile`.
pub fn sanitize_file_name(name: &str) -> String {
    const INVALID: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    let sanitized = name
        .split(|c: char| INVALID.contains(&c) || c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let sanitized = sanitized.trim().trim_end_matches(['.', ' ']);

    if sanitized.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        sanitized.to_string()
    }
}

/// `<sanitized name>_<8 hex chars>.rdp`
pub fn generate_file_name(name: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}.{RDP_EXTENSION}",
        sanitize_file_name(name),
        &suffix[..8]
    )
}
