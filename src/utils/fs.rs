//! File system helpers
//!
//! Every document this crate owns (`profiles.json`, `settings.json`, `.rdp`
//! files, backups) is written through [`atomic_write`], so readers never see a
//! half-written file.

use crate::error::{RdpShelfError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `contents` to `path` atomically
///
/// The data goes to a temporary file in the destination directory first and
/// is then persisted over `path` with a single rename. The destination
/// directory is created if it does not exist.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let temp = staged(path, contents)?;
    temp.persist(path)
        .map_err(|e| RdpShelfError::PersistFailed {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    Ok(())
}

/// Write `contents` to `path` atomically, refusing to replace an existing file
///
/// Fails with [`RdpShelfError::PersistFailed`] whose source has kind
/// [`std::io::ErrorKind::AlreadyExists`] when `path` is taken; see
/// [`is_already_exists`].
pub fn atomic_create(path: &Path, contents: &[u8]) -> Result<()> {
    let temp = staged(path, contents)?;
    temp.persist_noclobber(path)
        .map_err(|e| RdpShelfError::PersistFailed {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    Ok(())
}

/// Whether `error` is an [`atomic_create`] hitting an existing file
pub fn is_already_exists(error: &RdpShelfError) -> bool {
    matches!(
        error,
        RdpShelfError::PersistFailed { source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists
    )
}

fn staged(path: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}

/// File name without its extension, as used for default profile names
///
/// `"Server 1.rdp"` becomes `"Server 1"`. Falls back to the input when the
/// name has no stem.
pub fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .map_or_else(|| file_name.to_string(), ToString::to_string)
}
