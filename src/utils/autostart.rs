//! Auto-start registry management
//!
//! Starting at login is a value under the current user's
//! `Software\Microsoft\Windows\CurrentVersion\Run` key holding the quoted path
//! of the running executable. On other platforms registration is a no-op.

use crate::error::Result;
use std::path::Path;

/// Run key under `HKEY_CURRENT_USER`
pub const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Value name written under [`RUN_KEY`]
pub const RUN_VALUE: &str = "RdpShelf";

/// Registers the application to start at login
pub trait StartupRegistration: Send + Sync {
    /// Whether the application is currently registered
    fn is_enabled(&self) -> Result<bool>;

    /// Register or unregister the application
    fn set_enabled(&self, enabled: bool) -> Result<()>;
}

impl<T: StartupRegistration + ?Sized> StartupRegistration for std::sync::Arc<T> {
    fn is_enabled(&self) -> Result<bool> {
        (**self).is_enabled()
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        (**self).set_enabled(enabled)
    }
}

/// Command line stored in the Run value for `exe`
pub fn run_command(exe: &Path) -> String {
    format!("\"{}\"", exe.display())
}

/// Auto-start manager backed by the Windows registry
#[derive(Debug, Clone, Default)]
pub struct AutoStartManager;

impl AutoStartManager {
    /// Manager for the running executable
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
mod registry {
    use super::{RUN_KEY, RUN_VALUE, run_command};
    use crate::error::{RdpShelfError, Result};
    use tracing::{debug, info};
    use winreg::RegKey;
    use winreg::enums::HKEY_CURRENT_USER;

    fn config_error(e: std::io::Error) -> RdpShelfError {
        RdpShelfError::ConfigError(Box::new(e))
    }

    pub fn is_enabled() -> Result<bool> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let Ok(run) = hkcu.open_subkey(RUN_KEY) else {
            return Ok(false);
        };
        Ok(run.get_value::<String, _>(RUN_VALUE).is_ok())
    }

    pub fn enable() -> Result<()> {
        let exe = std::env::current_exe()?;
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (run, _) = hkcu.create_subkey(RUN_KEY).map_err(config_error)?;
        run.set_value(RUN_VALUE, &run_command(&exe))
            .map_err(config_error)?;
        info!("Registered {} to start at login", exe.display());
        Ok(())
    }

    pub fn disable() -> Result<()> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (run, _) = hkcu.create_subkey(RUN_KEY).map_err(config_error)?;
        match run.delete_value(RUN_VALUE) {
            Ok(()) => info!("Removed start at login registration"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Start at login was not registered");
            }
            Err(e) => return Err(config_error(e)),
        }
        Ok(())
    }
}

#[cfg(windows)]
impl StartupRegistration for AutoStartManager {
    fn is_enabled(&self) -> Result<bool> {
        registry::is_enabled()
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if enabled {
            registry::enable()
        } else {
            registry::disable()
        }
    }
}

#[cfg(not(windows))]
impl StartupRegistration for AutoStartManager {
    fn is_enabled(&self) -> Result<bool> {
        Ok(false)
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        tracing::debug!(
            "Start at login ({}) is only supported on Windows",
            if enabled { "enable" } else { "disable" }
        );
        Ok(())
    }
}
