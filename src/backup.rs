//! Profile metadata backups
//!
//! A backup is a copy of the profile list written to the data directory as
//! `profiles_backup_<yyyyMMdd_HHmmss>.json` (local time). A second backup in
//! the same second gets a sequence suffix, `profiles_backup_<stamp>_1.json`,
//! instead of replacing the first. The timestamp and sequence in the name
//! order backups, so listing does not depend on file system metadata.

use crate::config::AppSettings;
use crate::error::{RdpShelfError, Result, StringError};
use crate::profile::Profile;
use crate::utils::{atomic_create, is_already_exists};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const BACKUP_PREFIX: &str = "profiles_backup_";
const BACKUP_SUFFIX: &str = ".json";
const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const BACKUP_STAMP_LEN: usize = "yyyymmdd_hhmmss".len();

/// Backups allowed within one second before giving up
const MAX_SEQUENCE: u32 = 100;

/// Minimum time between automatic backups
pub const AUTO_BACKUP_INTERVAL_HOURS: i64 = 24;

/// File name of a backup taken at `now`
pub fn backup_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{BACKUP_PREFIX}{}{BACKUP_SUFFIX}",
        now.format(BACKUP_STAMP_FORMAT)
    )
}

fn sequenced_file_name<Tz: TimeZone>(now: &DateTime<Tz>, sequence: u32) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if sequence == 0 {
        return backup_file_name(now);
    }
    format!(
        "{BACKUP_PREFIX}{}_{sequence}{BACKUP_SUFFIX}",
        now.format(BACKUP_STAMP_FORMAT)
    )
}

/// Timestamp and sequence of a backup file name, `None` for other files
fn parse_backup_file_name(name: &str) -> Option<(NaiveDateTime, u32)> {
    let rest = name.strip_prefix(BACKUP_PREFIX)?.strip_suffix(BACKUP_SUFFIX)?;
    let (stamp, sequence) = rest.split_at_checked(BACKUP_STAMP_LEN)?;
    let stamp = NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP_FORMAT).ok()?;
    let sequence = match sequence {
        "" => 0,
        _ => sequence
            .strip_prefix('_')?
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)?,
    };
    Some((stamp, sequence))
}

/// Write `profiles` as a backup in `data_dir` and return its path
///
/// Never replaces an existing backup: when the name for `now` is taken, the
/// next free sequence suffix is used.
pub fn create_backup(data_dir: &Path, profiles: &[Profile], now: DateTime<Local>) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(profiles)?;

    for sequence in 0..MAX_SEQUENCE {
        let path = data_dir.join(sequenced_file_name(&now, sequence));
        match atomic_create(&path, json.as_bytes()) {
            Ok(()) => {
                if sequence > 0 {
                    info!(
                        "Backup name for {} taken, used sequence {}",
                        now.format(BACKUP_STAMP_FORMAT),
                        sequence
                    );
                }
                info!("Backed up {} profiles to {}", profiles.len(), path.display());
                return Ok(path);
            }
            Err(e) if is_already_exists(&e) => {
                debug!("{} exists, trying the next name", path.display());
            }
            Err(e) => return Err(RdpShelfError::BackupError(Box::new(e))),
        }
    }

    Err(RdpShelfError::BackupError(StringError::new(format!(
        "more than {MAX_SEQUENCE} backups at {}",
        now.format(BACKUP_STAMP_FORMAT)
    ))))
}

/// Backup files in `data_dir`, newest first
pub fn list_backups(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(data_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut backups: Vec<((NaiveDateTime, u32), String)> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| Some((parse_backup_file_name(&name)?, name)))
        .collect();
    backups.sort_unstable_by(|a, b| b.cmp(a));

    Ok(backups
        .into_iter()
        .map(|(_, name)| data_dir.join(name))
        .collect())
}

/// Delete all but the newest `keep` backups and return how many were removed
///
/// Individual delete failures are logged and skipped.
pub fn prune_backups(data_dir: &Path, keep: usize) -> Result<usize> {
    let mut removed = 0;
    for path in list_backups(data_dir)?.into_iter().skip(keep) {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed old backup {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to remove old backup {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

/// Whether an automatic backup should run at `now`
pub fn backup_due(settings: &AppSettings, now: DateTime<Utc>) -> bool {
    settings.auto_backup
        && settings
            .last_backup
            .is_none_or(|last| now - last >= Duration::hours(AUTO_BACKUP_INTERVAL_HOURS))
}
