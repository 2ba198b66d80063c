//! Remote desktop client launching
//!
//! Sessions are opened by handing the `.rdp` file to the Windows Remote
//! Desktop Connection client. The child process is not waited on or
//! tracked; a successful spawn counts as a successful connect.

use crate::error::{RdpShelfError, Result, StringError};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Executable of the Windows Remote Desktop Connection client
pub const MSTSC_EXE: &str = "mstsc.exe";

/// Starts a remote desktop session for a `.rdp` file
pub trait SessionLauncher: Send + Sync {
    /// Launch a session for the file at `rdp_path`
    fn launch(&self, rdp_path: &Path) -> Result<()>;
}

impl<T: SessionLauncher + ?Sized> SessionLauncher for std::sync::Arc<T> {
    fn launch(&self, rdp_path: &Path) -> Result<()> {
        (**self).launch(rdp_path)
    }
}

/// Launches `mstsc.exe "<path>"`
#[derive(Debug, Clone)]
pub struct MstscLauncher {
    program: PathBuf,
}

impl Default for MstscLauncher {
    fn default() -> Self {
        Self {
            program: PathBuf::from(MSTSC_EXE),
        }
    }
}

impl MstscLauncher {
    /// Launcher using `mstsc.exe` from `PATH`
    pub fn new() -> Self {
        Self::default()
    }

    /// Launcher using a different client executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SessionLauncher for MstscLauncher {
    fn launch(&self, rdp_path: &Path) -> Result<()> {
        let path = std::path::absolute(rdp_path)?;
        debug!("Spawning {} {}", self.program.display(), path.display());

        Command::new(&self.program)
            .arg(&path)
            .spawn()
            .map_err(|e| RdpShelfError::LaunchFailed(Box::new(e)))?;

        info!("Launched remote desktop session for {}", path.display());
        Ok(())
    }
}

/// Open the folder containing `path` in the system file manager
pub fn reveal_in_file_manager(path: &Path) -> Result<()> {
    let folder = if path.is_dir() {
        path
    } else {
        path.parent().ok_or_else(|| {
            RdpShelfError::LaunchFailed(StringError::new(format!(
                "{} has no parent folder",
                path.display()
            )))
        })?
    };

    open::that(folder).map_err(|e| RdpShelfError::LaunchFailed(Box::new(e)))?;
    info!("Opened {}", folder.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_dir;

    #[test]
    fn test_default_program() {
        assert_eq!(MstscLauncher::new().program, PathBuf::from("mstsc.exe"));
    }

    #[test]
    fn test_missing_program_maps_to_launch_failed() {
        let temp_dir = create_test_dir();
        let launcher = MstscLauncher::with_program(temp_dir.path().join("no-such-client"));

        let result = launcher.launch(&temp_dir.path().join("a.rdp"));

        assert!(matches!(result, Err(RdpShelfError::LaunchFailed(_))));
    }

    #[test]
    fn test_reveal_root_without_parent_fails() {
        let result = reveal_in_file_manager(Path::new(""));
        assert!(matches!(result, Err(RdpShelfError::LaunchFailed(_))));
    }
}
