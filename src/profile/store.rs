//! Profile metadata store
//!
//! [`ProfileStore`] owns the in-memory profile list and its JSON document
//! (`profiles.json` in the data directory). Every mutation is written back
//! immediately through an atomic temp-file-and-rename.
//!
//! A document that cannot be read or parsed is moved aside to
//! `profiles.corrupt-<timestamp>.json` before anything else is written. When
//! it cannot be moved, the store refuses every write until a reload succeeds,
//! so a save never replaces the only copy of the user's metadata.

use super::files::RdpDirectory;
use super::models::{DEFAULT_HOST, PROFILE_FIELDS, Profile, generate_profile_id};
use crate::error::{RdpShelfError, Result};
use crate::notify::{Notification, NotificationLevel, NotificationSink};
use crate::utils::{atomic_write, canonicalize_keys, file_stem};
use chrono::{Local, Utc};
use serde::de::Error as _;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File name of the metadata document inside the data directory
pub const PROFILES_FILE: &str = "profiles.json";

/// Result of reading the metadata document
#[derive(Debug)]
pub enum LoadOutcome {
    /// No document exists yet
    Missing,
    /// The document was parsed
    Loaded(Vec<Profile>),
    /// The document exists but is not valid UTF-8 or not a valid profile list
    Corrupt {
        /// Decoding or parse failure
        error: serde_json::Error,
    },
}

/// A scanned file that reconciliation could not adopt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// File name inside the profile directory
    pub file: String,
    /// Why it was skipped
    pub reason: String,
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Files that became new profiles
    pub added: Vec<String>,
    /// Files that could not be read
    pub skipped: Vec<SkippedFile>,
    /// Profile count after the pass
    pub total: usize,
}

impl ReconcileReport {
    /// Whether the pass changed nothing and skipped nothing
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.skipped.is_empty()
    }
}

/// In-memory profile list backed by `profiles.json`
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<Profile>,
    sink: Arc<dyn NotificationSink>,
    // Set when an unreadable document is still in place
    write_blocked: bool,
}

impl std::fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore")
            .field("path", &self.path)
            .field("profiles", &self.profiles.len())
            .field("write_blocked", &self.write_blocked)
            .finish_non_exhaustive()
    }
}

impl ProfileStore {
    /// Open the store in `data_dir` and load the document
    ///
    /// Creates `data_dir` if needed. A missing or corrupt document yields an
    /// empty store; see [`ProfileStore::load_all`].
    pub fn open(data_dir: &Path, sink: Arc<dyn NotificationSink>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let mut store = Self {
            path: data_dir.join(PROFILES_FILE),
            profiles: Vec::new(),
            sink,
            write_blocked: false,
        };
        store.reload();
        info!(
            "Loaded {} profiles from {}",
            store.profiles.len(),
            store.path.display()
        );
        Ok(store)
    }

    /// Path of the metadata document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether writes are refused because an unreadable document could not
    /// be moved aside
    pub fn is_write_blocked(&self) -> bool {
        self.write_blocked
    }

    /// Read the document without touching it
    ///
    /// Field names match case-insensitively. A document that is not valid
    /// UTF-8 is reported as corrupt. I/O errors other than not-found are
    /// returned.
    pub fn load_checked(&self) -> Result<LoadOutcome> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist", self.path.display());
                return Ok(LoadOutcome::Missing);
            }
            Err(e) => return Err(e.into()),
        };

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                return Ok(LoadOutcome::Corrupt {
                    error: serde_json::Error::custom(format!("invalid UTF-8: {e}")),
                });
            }
        };

        Ok(match parse_document(&text) {
            Ok(profiles) => LoadOutcome::Loaded(profiles),
            Err(error) => LoadOutcome::Corrupt { error },
        })
    }

    /// Read the document, falling back to an empty list
    ///
    /// A corrupt document is quarantined and reported as critical. A document
    /// that exists but cannot be read is quarantined too and reported as an
    /// error. Neither failure is returned to the caller.
    pub fn load_all(&self) -> Vec<Profile> {
        self.load_guarded().0
    }

    /// Load the document and report whether an unreadable one is still in
    /// place
    fn load_guarded(&self) -> (Vec<Profile>, bool) {
        match self.load_checked() {
            Ok(LoadOutcome::Missing) => (Vec::new(), false),
            Ok(LoadOutcome::Loaded(profiles)) => (profiles, false),
            Ok(LoadOutcome::Corrupt { error }) => {
                warn!("{} is corrupt: {}", self.path.display(), error);
                let (detail, blocked) = self.set_aside(&error);
                self.sink.notify(
                    Notification::new(
                        NotificationLevel::Critical,
                        "Profile metadata is corrupt, starting with an empty list",
                    )
                    .with_detail(detail),
                );
                (Vec::new(), blocked)
            }
            Err(error) => {
                warn!("Failed to read {}: {}", self.path.display(), error);
                let (detail, blocked) = self.set_aside(&error);
                self.sink.notify(
                    Notification::new(NotificationLevel::Error, "Failed to read profile metadata")
                        .with_detail(detail),
                );
                (Vec::new(), blocked)
            }
        }
    }

    /// Quarantine the document; returns the notification detail and whether
    /// it is still in place
    fn set_aside(&self, error: &dyn std::fmt::Display) -> (String, bool) {
        match self.quarantine() {
            Ok(moved_to) => (format!("{error}; moved to {}", moved_to.display()), false),
            Err(e) => {
                warn!(
                    "Failed to quarantine {}, refusing to overwrite it: {}",
                    self.path.display(),
                    e
                );
                (
                    format!("{error}; could not be moved aside ({e}), changes will not be saved"),
                    true,
                )
            }
        }
    }

    /// Re-read the document into memory
    pub fn reload(&mut self) {
        let (profiles, blocked) = self.load_guarded();
        self.profiles = profiles;
        self.write_blocked = blocked;
    }

    /// Move the current document aside as `profiles.corrupt-<timestamp>.json`
    fn quarantine(&self) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let target = self.path.with_file_name(format!("profiles.corrupt-{stamp}.json"));
        std::fs::rename(&self.path, &target)?;
        info!("Moved corrupt metadata to {}", target.display());
        Ok(target)
    }

    /// Replace the whole list and write it
    ///
    /// The in-memory list only changes once the write has succeeded.
    pub fn save_all(&mut self, profiles: Vec<Profile>) -> Result<()> {
        self.ensure_writable()?;
        write_document(&self.path, &profiles)?;
        self.profiles = profiles;
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.ensure_writable()?;
        write_document(&self.path, &self.profiles)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.write_blocked {
            return Err(RdpShelfError::MetadataUnreadable(self.path.clone()));
        }
        Ok(())
    }

    /// All profiles, in document order
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Profile with `id`
    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Profile backed by `file`, compared ignoring case
    pub fn find_by_file(&self, file: &str) -> Option<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.file.eq_ignore_ascii_case(file))
    }

    /// Replace the profile with the same id, or append it
    pub fn upsert(&mut self, profile: Profile) -> Result<()> {
        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        self.persist()
    }

    /// Remove every profile with `id`
    ///
    /// Returns how many were removed. Nothing is written when none match.
    pub fn delete(&mut self, id: &str) -> Result<usize> {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.id != id);
        let removed = before - self.profiles.len();
        if removed == 0 {
            debug!("Delete of unknown profile {} ignored", id);
            return Ok(0);
        }

        self.persist()?;
        Ok(removed)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Profile> {
        self.profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RdpShelfError::ProfileNotFound(id.to_string()))
    }

    /// Record a connect to `id` at the current time
    pub fn mark_used(&mut self, id: &str) -> Result<()> {
        self.get_mut(id)?.last_used = Some(Utc::now());
        self.persist()
    }

    /// Flip the favorite flag of `id` and return the new value
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        let profile = self.get_mut(id)?;
        profile.favorite = !profile.favorite;
        let favorite = profile.favorite;
        self.persist()?;
        Ok(favorite)
    }

    /// Adopt every scanned `.rdp` file that no profile references yet
    ///
    /// New profiles get their name from the file stem, a fresh id, `localhost`
    /// when the file has no address, and the current time as creation time.
    /// Unreadable files are skipped and reported. The list is written at the
    /// end even when nothing was added.
    pub fn reconcile(&mut self, dir: &RdpDirectory, scanned: &[String]) -> Result<ReconcileReport> {
        let mut known: HashSet<String> = self
            .profiles
            .iter()
            .map(|p| p.file.to_lowercase())
            .collect();
        let mut report = ReconcileReport::default();

        for file in scanned {
            if !known.insert(file.to_lowercase()) {
                continue;
            }

            match dir.read(file) {
                Ok(mut profile) => {
                    if profile.name.trim().is_empty() {
                        profile.name = file_stem(file);
                    }
                    if profile.id.trim().is_empty() {
                        profile.id = generate_profile_id();
                    }
                    if profile.host.trim().is_empty() {
                        profile.host = DEFAULT_HOST.to_string();
                    }
                    profile.file.clone_from(file);
                    profile.created_at = Utc::now();

                    debug!("Adopted {} as profile {}", file, profile.id);
                    self.profiles.push(profile);
                    report.added.push(file.clone());
                }
                Err(e) => {
                    warn!("Skipping unreadable RDP file {}: {}", file, e);
                    self.sink.notify(
                        Notification::new(NotificationLevel::Warning, "Skipped unreadable RDP file")
                            .with_detail(format!("{file}: {e}")),
                    );
                    report.skipped.push(SkippedFile {
                        file: file.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.persist()?;
        report.total = self.profiles.len();

        if !report.added.is_empty() {
            info!("Reconciled {} new RDP files", report.added.len());
        }
        Ok(report)
    }
}

/// Parse a metadata document
///
/// Accepts a UTF-8 byte order mark and a `null` document (an empty list).
pub fn parse_document(text: &str) -> std::result::Result<Vec<Profile>, serde_json::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut value: serde_json::Value = serde_json::from_str(text)?;
    canonicalize_keys(&mut value, PROFILE_FIELDS);
    let profiles: Option<Vec<Profile>> = serde_json::from_value(value)?;
    Ok(profiles.unwrap_or_default())
}

fn write_document(path: &Path, profiles: &[Profile]) -> Result<()> {
    let json = serde_json::to_string_pretty(profiles)?;
    atomic_write(path, json.as_bytes())?;
    debug!("Saved {} profiles to {}", profiles.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemorySink;
    use crate::test_utils::{create_test_dir, sample_profile, write_rdp_file};

    fn open_store(data_dir: &Path) -> (ProfileStore, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let store = ProfileStore::open(data_dir, sink.clone()).unwrap();
        (store, sink)
    }

    #[test]
    fn test_open_missing_document_is_empty() {
        let temp_dir = create_test_dir();
        let (store, sink) = open_store(temp_dir.path());

        assert!(store.profiles().is_empty());
        assert!(sink.snapshot().is_empty());
        assert!(matches!(store.load_checked().unwrap(), LoadOutcome::Missing));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = create_test_dir();
        let (mut store, _) = open_store(temp_dir.path());
        let mut profile = sample_profile("Server", "10.0.0.1");
        profile.tags = vec!["prod".to_string()];
        profile.last_used = Some(Utc::now());

        store.save_all(vec![profile.clone()]).unwrap();

        let (reopened, _) = open_store(temp_dir.path());
        assert_eq!(reopened.profiles(), &[profile]);
    }

    #[test]
    fn test_document_is_pretty_camel_case() {
        let temp_dir = create_test_dir();
        let (mut store, _) = open_store(temp_dir.path());
        store.upsert(sample_profile("a", "h")).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  {"));
        assert!(text.contains("\"createdAt\""));
        assert!(text.contains("\"useAllMonitors\""));
    }

    #[test]
    fn test_reads_pascal_case_fields() {
        let temp_dir = create_test_dir();
        std::fs::write(
            temp_dir.path().join(PROFILES_FILE),
            r#"[{"Id":"abc","Name":"Legacy","File":"legacy.rdp","Host":"h","Favorite":true,"LastUsed":null,"CreatedAt":"2024-01-01T00:00:00"}]"#,
        )
        .unwrap();

        let (store, _) = open_store(temp_dir.path());

        let profile = store.get("abc").unwrap();
        assert_eq!(profile.name, "Legacy");
        assert!(profile.favorite);
    }

    #[test]
    fn test_null_fields_do_not_fail_document() {
        let temp_dir = create_test_dir();
        std::fs::write(
            temp_dir.path().join(PROFILES_FILE),
            r#"[{"id":"a","name":"First","file":"a.rdp","host":"h1","notes":null,"tags":null,"favorite":null},
                {"id":"b","name":null,"file":"b.rdp","host":"h2","username":null,"domain":null,"resolution":null,"createdAt":null}]"#,
        )
        .unwrap();

        let (store, sink) = open_store(temp_dir.path());

        assert_eq!(store.profiles().len(), 2);
        assert!(sink.snapshot().is_empty());
        assert_eq!(store.get("a").unwrap().notes, "");
        assert!(store.get("a").unwrap().tags.is_empty());
        assert_eq!(store.get("b").unwrap().host, "h2");
        assert!(store.path().exists());
    }

    #[test]
    fn test_null_document_is_empty() {
        let temp_dir = create_test_dir();
        std::fs::write(temp_dir.path().join(PROFILES_FILE), "null").unwrap();

        let (store, sink) = open_store(temp_dir.path());

        assert!(store.profiles().is_empty());
        assert!(sink.snapshot().is_empty());
    }

    #[test]
    fn test_corrupt_document_is_quarantined() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join(PROFILES_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let (store, sink) = open_store(temp_dir.path());

        assert!(store.profiles().is_empty());
        assert!(!path.exists());
        let quarantined: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.unwrap().file_name().into_string().ok())
            .filter(|name| name.starts_with("profiles.corrupt-"))
            .collect();
        assert_eq!(quarantined.len(), 1);
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join(&quarantined[0])).unwrap(),
            "{ not json"
        );
        assert_eq!(sink.count_at_least(NotificationLevel::Critical), 1);
    }

    #[test]
    fn test_invalid_utf8_document_is_quarantined() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join(PROFILES_FILE);
        let bytes = b"[{\"id\":\"a\",\"name\":\"caf\xe9\"}]".to_vec();
        std::fs::write(&path, &bytes).unwrap();

        let (mut store, sink) = open_store(temp_dir.path());

        assert!(store.profiles().is_empty());
        assert!(!store.is_write_blocked());
        assert_eq!(sink.count_at_least(NotificationLevel::Critical), 1);
        let quarantined: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.unwrap().file_name().into_string().ok())
            .filter(|name| name.starts_with("profiles.corrupt-"))
            .collect();
        assert_eq!(quarantined.len(), 1);
        assert_eq!(
            std::fs::read(temp_dir.path().join(&quarantined[0])).unwrap(),
            bytes
        );

        store.upsert(sample_profile("fresh", "h")).unwrap();
        assert_eq!(store.load_all().len(), 1);
    }

    #[test]
    fn test_load_checked_reports_invalid_utf8_as_corrupt() {
        let temp_dir = create_test_dir();
        let (store, _) = open_store(temp_dir.path());
        std::fs::write(store.path(), [0xFF, 0xFE, b'[', b']']).unwrap();

        assert!(matches!(
            store.load_checked().unwrap(),
            LoadOutcome::Corrupt { .. }
        ));
    }

    #[test]
    fn test_unreadable_document_is_moved_aside() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join(PROFILES_FILE);
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("inside.txt"), "keep").unwrap();

        let (store, sink) = open_store(temp_dir.path());

        assert!(store.profiles().is_empty());
        assert!(!store.is_write_blocked());
        assert_eq!(sink.count_at_least(NotificationLevel::Error), 1);
        let moved: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().contains("profiles.corrupt-"))
            .collect();
        assert_eq!(moved.len(), 1);
        assert_eq!(
            std::fs::read_to_string(moved[0].join("inside.txt")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn test_blocked_store_refuses_writes() {
        let temp_dir = create_test_dir();
        let (mut store, _) = open_store(temp_dir.path());
        std::fs::write(store.path(), "original bytes").unwrap();
        store.write_blocked = true;

        let result = store.upsert(sample_profile("a", "h"));

        assert!(matches!(result, Err(RdpShelfError::MetadataUnreadable(_))));
        assert!(matches!(
            store.save_all(Vec::new()),
            Err(RdpShelfError::MetadataUnreadable(_))
        ));
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "original bytes"
        );
    }

    #[test]
    fn test_load_checked_reports_corrupt() {
        let temp_dir = create_test_dir();
        let (store, _) = open_store(temp_dir.path());
        std::fs::write(store.path(), r#"{"id": 1}"#).unwrap();

        assert!(matches!(
            store.load_checked().unwrap(),
            LoadOutcome::Corrupt { .. }
        ));
        assert!(store.path().exists(), "load_checked must not move the file");
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let temp_dir = create_test_dir();
        let (mut store, _) = open_store(temp_dir.path());
        let mut profile = sample_profile("before", "h");
        store.upsert(profile.clone()).unwrap();

        profile.name = "after".to_string();
        store.upsert(profile.clone()).unwrap();

        assert_eq!(store.profiles().len(), 1);
        assert_eq!(store.get(&profile.id).unwrap().name, "after");
    }

    #[test]
    fn test_delete_removes_all_matching() {
        let temp_dir = create_test_dir();
        let (mut store, _) = open_store(temp_dir.path());
        let profile = sample_profile("a", "h");
        let other = sample_profile("b", "h");
        store
            .save_all(vec![profile.clone(), other.clone(), profile.clone()])
            .unwrap();

        assert_eq!(store.delete(&profile.id).unwrap(), 2);
        assert_eq!(store.profiles(), &[other]);
    }

    #[test]
    fn test_delete_unknown_id_does_not_rewrite() {
        let temp_dir = create_test_dir();
        let (mut store, _) = open_store(temp_dir.path());
        store.upsert(sample_profile("a", "h")).unwrap();
        std::fs::write(store.path(), "sentinel").unwrap();

        assert_eq!(store.delete("no-such-id").unwrap(), 0);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "sentinel");
    }

    #[test]
    fn test_mark_used_and_toggle_favorite() {
        let temp_dir = create_test_dir();
        let (mut store, _) = open_store(temp_dir.path());
        let profile = sample_profile("a", "h");
        let id = profile.id.clone();
        store.upsert(profile).unwrap();

        store.mark_used(&id).unwrap();
        assert!(store.get(&id).unwrap().last_used.is_some());

        assert!(store.toggle_favorite(&id).unwrap());
        assert!(!store.toggle_favorite(&id).unwrap());

        assert!(matches!(
            store.mark_used("missing"),
            Err(RdpShelfError::ProfileNotFound(_))
        ));
        assert!(matches!(
            store.toggle_favorite("missing"),
            Err(RdpShelfError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_find_by_file_ignores_case() {
        let temp_dir = create_test_dir();
        let (mut store, _) = open_store(temp_dir.path());
        let mut profile = sample_profile("a", "h");
        profile.file = "Server.rdp".to_string();
        store.upsert(profile).unwrap();

        assert!(store.find_by_file("server.RDP").is_some());
        assert!(store.find_by_file("other.rdp").is_none());
    }

    #[test]
    fn test_reconcile_adopts_new_files() {
        let temp_dir = create_test_dir();
        let rdp_dir = RdpDirectory::new(temp_dir.path().join("profiles")).unwrap();
        write_rdp_file(
            rdp_dir.root(),
            "Jump Box.rdp",
            &["full address:s:jump.corp", "username:s:CORP\\ops"],
        );
        write_rdp_file(rdp_dir.root(), "blank.rdp", &["screen mode id:i:2"]);
        let (mut store, _) = open_store(temp_dir.path());

        let report = store.reconcile(&rdp_dir, &rdp_dir.scan()).unwrap();

        assert_eq!(report.added.len(), 2);
        assert_eq!(report.total, 2);
        let jump = store.find_by_file("Jump Box.rdp").unwrap();
        assert_eq!(jump.name, "Jump Box");
        assert_eq!(jump.host, "jump.corp");
        assert_eq!(jump.domain, "CORP");
        assert!(!jump.id.is_empty());
        let blank = store.find_by_file("blank.rdp").unwrap();
        assert_eq!(blank.host, DEFAULT_HOST);
        assert!(store.path().exists());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let temp_dir = create_test_dir();
        let rdp_dir = RdpDirectory::new(temp_dir.path().join("profiles")).unwrap();
        write_rdp_file(rdp_dir.root(), "a.rdp", &["full address:s:a"]);
        let (mut store, _) = open_store(temp_dir.path());

        store.reconcile(&rdp_dir, &rdp_dir.scan()).unwrap();
        let first = store.profiles().to_vec();
        let report = store.reconcile(&rdp_dir, &rdp_dir.scan()).unwrap();

        assert!(report.is_unchanged());
        assert_eq!(store.profiles(), first.as_slice());
    }

    #[test]
    fn test_reconcile_keeps_existing_metadata() {
        let temp_dir = create_test_dir();
        let rdp_dir = RdpDirectory::new(temp_dir.path().join("profiles")).unwrap();
        write_rdp_file(rdp_dir.root(), "known.rdp", &["full address:s:new-host"]);
        let (mut store, _) = open_store(temp_dir.path());
        let mut profile = sample_profile("Known", "old-host");
        profile.file = "known.rdp".to_string();
        profile.notes = "keep me".to_string();
        store.upsert(profile.clone()).unwrap();

        let report = store.reconcile(&rdp_dir, &rdp_dir.scan()).unwrap();

        assert!(report.added.is_empty());
        assert_eq!(store.profiles(), &[profile]);
    }

    #[test]
    fn test_reconcile_skips_unreadable_and_continues() {
        let temp_dir = create_test_dir();
        let rdp_dir = RdpDirectory::new(temp_dir.path().join("profiles")).unwrap();
        write_rdp_file(rdp_dir.root(), "good.rdp", &["full address:s:good"]);
        let (mut store, sink) = open_store(temp_dir.path());
        let scanned = vec!["vanished.rdp".to_string(), "good.rdp".to_string()];

        let report = store.reconcile(&rdp_dir, &scanned).unwrap();

        assert_eq!(report.added, vec!["good.rdp".to_string()]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].file, "vanished.rdp");
        assert_eq!(sink.count_at_least(NotificationLevel::Warning), 1);
    }

    #[test]
    fn test_reconcile_empty_directory_still_saves() {
        let temp_dir = create_test_dir();
        let rdp_dir = RdpDirectory::new(temp_dir.path().join("profiles")).unwrap();
        let (mut store, _) = open_store(temp_dir.path());

        let report = store.reconcile(&rdp_dir, &[]).unwrap();

        assert_eq!(report.total, 0);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[test]
    fn test_parse_document_accepts_bom() {
        let profiles = parse_document("\u{feff}[{\"id\":\"x\"}]").unwrap();
        assert_eq!(profiles[0].id, "x");
    }
}
