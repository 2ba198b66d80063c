#![expect(
    clippy::unwrap_used,
    reason = "Test utilities use .unwrap() for brevity"
)]

//! Shared test utilities for `rdpshelf` unit tests.
//!
//! This module provides common test infrastructure used across multiple test modules.
//! It is only compiled during testing (`#[cfg(test)]`).

use crate::config::manager::DATA_DIR_ENV;
use crate::error::{RdpShelfError, Result, StringError};
use crate::launcher::SessionLauncher;
use crate::profile::Profile;
use crate::utils::StartupRegistration;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize tests that modify the data directory environment
/// variable.
static DATA_DIR_LOCK: Mutex<()> = Mutex::new(());

/// Helper function to create a temporary test directory using tempfile.
/// Returns a `TempDir` that automatically cleans up when dropped.
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Write an `.rdp` file with CRLF line endings, creating `dir` if needed
pub fn write_rdp_file(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let mut text = lines.join("\r\n");
    text.push_str("\r\n");
    std::fs::write(&path, text).unwrap();
    path
}

/// A profile with a fresh id and a file name derived from `name`
pub fn sample_profile(name: &str, host: &str) -> Profile {
    let mut profile = Profile::new(name, host);
    profile.file = format!("{name}.rdp");
    profile
}

/// Session launcher that records paths instead of starting a client
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    launched: parking_lot::Mutex<Vec<PathBuf>>,
    contents: parking_lot::Mutex<Vec<String>>,
    fail_next: parking_lot::Mutex<bool>,
}

impl RecordingLauncher {
    /// Paths launched so far
    pub fn launched(&self) -> Vec<PathBuf> {
        self.launched.lock().clone()
    }

    /// Text of each launched file, read at launch time
    pub fn contents(&self) -> Vec<String> {
        self.contents.lock().clone()
    }

    /// Make the next launch fail with `LaunchFailed`
    pub fn fail_next(&self) {
        *self.fail_next.lock() = true;
    }
}

impl SessionLauncher for RecordingLauncher {
    fn launch(&self, rdp_path: &Path) -> Result<()> {
        if std::mem::take(&mut *self.fail_next.lock()) {
            return Err(RdpShelfError::LaunchFailed(StringError::new(
                "client not available",
            )));
        }
        self.contents
            .lock()
            .push(std::fs::read_to_string(rdp_path).unwrap_or_default());
        self.launched.lock().push(rdp_path.to_path_buf());
        Ok(())
    }
}

/// Start-at-login registration that records requests instead of touching the
/// registry
#[derive(Debug, Default)]
pub struct RecordingStartup {
    calls: parking_lot::Mutex<Vec<bool>>,
    fail: parking_lot::Mutex<bool>,
}

impl RecordingStartup {
    /// Every `set_enabled` argument so far
    pub fn calls(&self) -> Vec<bool> {
        self.calls.lock().clone()
    }

    /// Make every following `set_enabled` fail
    pub fn fail(&self) {
        *self.fail.lock() = true;
    }
}

impl StartupRegistration for RecordingStartup {
    fn is_enabled(&self) -> Result<bool> {
        Ok(self.calls.lock().last().copied().unwrap_or(false))
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if *self.fail.lock() {
            return Err(RdpShelfError::ConfigError(StringError::new(
                "registry access denied",
            )));
        }
        self.calls.lock().push(enabled);
        Ok(())
    }
}

/// RAII guard that sets `RDPSHELF_DATA_DIR` for a test scope and restores the
/// original value when dropped.
///
/// # Safety Considerations
///
/// `std::env::set_var` and `std::env::remove_var` are unsafe because another
/// thread may read the environment concurrently. The `DATA_DIR_LOCK` mutex
/// serializes every test that touches the variable, and the guard restores
/// the original value on drop, including on panic.
pub struct DataDirGuard {
    original: Option<String>,
    // Held for the lifetime of the guard
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[expect(
    unsafe_code,
    reason = "Test-only code that modifies environment variables under a global lock"
)]
impl DataDirGuard {
    /// Create a new guard that points the data directory at `temp_dir`.
    pub fn new(temp_dir: &TempDir) -> Self {
        let lock = DATA_DIR_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let original = std::env::var(DATA_DIR_ENV).ok();
        // SAFETY: DATA_DIR_LOCK is held, so no other test reads or writes the
        // variable until this guard is dropped.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, temp_dir.path());
        }
        Self {
            original,
            _lock: lock,
        }
    }
}

#[expect(
    unsafe_code,
    reason = "Test-only code that restores environment variables under a global lock"
)]
impl Drop for DataDirGuard {
    fn drop(&mut self) {
        // SAFETY: the lock is still held by this guard.
        if let Some(ref original) = self.original {
            unsafe {
                std::env::set_var(DATA_DIR_ENV, original);
            }
        } else {
            unsafe {
                std::env::remove_var(DATA_DIR_ENV);
            }
        }
    }
}
