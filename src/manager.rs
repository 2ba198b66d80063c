//! Profile manager
//!
//! [`ProfileManager`] is the entry point a front end talks to. It owns the
//! settings, the profile directory and the metadata store, keeps them in
//! step, and reports swallowed failures through the notification sink.
//!
//! All operations take `&mut self`; a front end that shares the manager
//! between threads wraps it in a mutex.

use crate::backup;
use crate::config::{AppSettings, SettingsManager};
use crate::error::{RdpShelfError, Result};
use crate::launcher::{SessionLauncher, reveal_in_file_manager};
use crate::notify::{Notification, NotificationLevel, NotificationSink};
use crate::profile::codec;
use crate::profile::models::generate_profile_id;
use crate::profile::search::{self, ProfileFilter};
use crate::profile::{Profile, ProfileStore, RdpDirectory, ReconcileReport};
use crate::utils::{AutoStartManager, StartupRegistration};
use chrono::{Local, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Number of backups kept after each backup
pub const MAX_BACKUPS: usize = 10;

/// How long a test connection file is kept after launching, so the client
/// can read it
pub const TEST_FILE_GRACE: Duration = Duration::from_secs(2);

/// Display name written into test connection files
pub const TEST_CONNECTION_NAME: &str = "Test Connection";

/// Coordinates settings, `.rdp` files, metadata and the session launcher
pub struct ProfileManager {
    settings_manager: SettingsManager,
    settings: AppSettings,
    rdp_dir: RdpDirectory,
    store: ProfileStore,
    launcher: Box<dyn SessionLauncher>,
    startup: Box<dyn StartupRegistration>,
    sink: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for ProfileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileManager")
            .field("data_dir", &self.settings_manager.data_dir())
            .field("rdp_dir", &self.rdp_dir.root())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ProfileManager {
    /// Open the manager on `data_dir`
    ///
    /// Loads settings, opens the profile directory and the metadata store,
    /// reconciles the directory, and takes an automatic backup when one is
    /// due. A failed automatic backup is reported, not returned. Fails with
    /// [`RdpShelfError::MetadataUnreadable`] when `profiles.json` could be
    /// neither read nor moved aside.
    pub fn open(
        data_dir: impl Into<PathBuf>,
        launcher: Box<dyn SessionLauncher>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let settings_manager = SettingsManager::new(data_dir);
        std::fs::create_dir_all(settings_manager.data_dir())?;
        let settings = settings_manager.load()?;
        let rdp_dir = RdpDirectory::new(settings_manager.profiles_dir(&settings))?;
        let store = ProfileStore::open(settings_manager.data_dir(), Arc::clone(&sink))?;

        let mut manager = Self {
            settings_manager,
            settings,
            rdp_dir,
            store,
            launcher,
            startup: Box::new(AutoStartManager::new()),
            sink,
        };

        manager.refresh()?;

        if backup::backup_due(&manager.settings, Utc::now()) {
            if let Err(e) = manager.backup_now() {
                warn!("Automatic backup failed: {}", e);
                manager.sink.notify(
                    Notification::new(NotificationLevel::Warning, "Automatic backup failed")
                        .with_detail(&e),
                );
            }
        }

        info!(
            "Profile manager ready: {} profiles in {}",
            manager.store.profiles().len(),
            manager.rdp_dir.root().display()
        );
        Ok(manager)
    }

    /// Use `startup` for start-at-login registration instead of the registry
    #[must_use]
    pub fn with_startup_registration(mut self, startup: Box<dyn StartupRegistration>) -> Self {
        self.startup = startup;
        self
    }

    /// Data directory
    pub fn data_dir(&self) -> &Path {
        self.settings_manager.data_dir()
    }

    /// Profile directory
    pub fn rdp_directory(&self) -> &RdpDirectory {
        &self.rdp_dir
    }

    /// Rescan the profile directory and adopt new `.rdp` files
    pub fn refresh(&mut self) -> Result<ReconcileReport> {
        let scanned = self.rdp_dir.scan();
        self.store.reconcile(&self.rdp_dir, &scanned)
    }

    /// All profiles, in document order
    pub fn profiles(&self) -> &[Profile] {
        self.store.profiles()
    }

    /// Profile with `id`
    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.store.get(id)
    }

    fn require(&self, id: &str) -> Result<&Profile> {
        self.store
            .get(id)
            .ok_or_else(|| RdpShelfError::ProfileNotFound(id.to_string()))
    }

    /// Create a profile: write its `.rdp` file, then its metadata
    ///
    /// A blank id or file name is generated, a blank name falls back to the
    /// host, and the creation time is set to now. An id or file name that
    /// another profile already uses, or a file already in the folder, is
    /// rejected before anything is written.
    pub fn create_profile(&mut self, mut profile: Profile) -> Result<Profile> {
        validate(&profile)?;
        if profile.id.trim().is_empty() {
            profile.id = generate_profile_id();
        }
        if self.store.get(&profile.id).is_some() {
            return Err(RdpShelfError::InvalidProfile(format!(
                "a profile with id {} already exists",
                profile.id
            )));
        }
        if !profile.file.trim().is_empty() {
            if let Some(owner) = self.store.find_by_file(&profile.file) {
                return Err(RdpShelfError::InvalidProfile(format!(
                    "{} is already used by profile {}",
                    profile.file, owner.name
                )));
            }
            if self.rdp_dir.exists(&profile.file) {
                return Err(RdpShelfError::InvalidProfile(format!(
                    "{} already exists in the profile folder",
                    profile.file
                )));
            }
        }
        if profile.name.trim().is_empty() {
            profile.name.clone_from(&profile.host);
        }
        profile.created_at = Utc::now();

        self.rdp_dir.create(&mut profile)?;
        self.store.upsert(profile.clone())?;
        info!("Created profile {} ({})", profile.name, profile.id);
        Ok(profile)
    }

    /// Rewrite an existing profile's `.rdp` file, then its metadata
    ///
    /// A blank file name keeps the stored one.
    pub fn update_profile(&mut self, mut profile: Profile) -> Result<()> {
        validate(&profile)?;
        let stored = self.require(&profile.id)?;
        if profile.file.trim().is_empty() {
            profile.file.clone_from(&stored.file);
        }

        self.rdp_dir.update(&profile)?;
        self.store.upsert(profile)?;
        Ok(())
    }

    /// Delete a profile's metadata, then its `.rdp` file
    ///
    /// Returns `false` for an unknown id. When the file cannot be deleted
    /// after the metadata is gone, [`RdpShelfError::OrphanedRdpFile`] is
    /// returned and the next refresh adopts the file again.
    pub fn delete_profile(&mut self, id: &str) -> Result<bool> {
        let Some(file) = self.store.get(id).map(|p| p.file.clone()) else {
            return Ok(false);
        };

        self.store.delete(id)?;

        if let Err(e) = self.rdp_dir.delete(&file) {
            let source = match e {
                RdpShelfError::IoError(source) => source,
                other => std::io::Error::other(other.to_string()),
            };
            warn!("Profile {} removed but {} remains: {}", id, file, source);
            self.sink.notify(
                Notification::new(
                    NotificationLevel::Error,
                    "Profile removed but its RDP file could not be deleted",
                )
                .with_detail(format!("{file}: {source}")),
            );
            return Err(RdpShelfError::OrphanedRdpFile { file, source });
        }

        info!("Deleted profile {}", id);
        Ok(true)
    }

    /// Launch a session for `id` and record the connect time
    ///
    /// The time is only recorded when the launch succeeds.
    pub fn connect(&mut self, id: &str) -> Result<()> {
        let file = &self.require(id)?.file;
        if !self.rdp_dir.exists(file) {
            return Err(RdpShelfError::RdpFileNotFound(self.rdp_dir.path_of(file)));
        }

        let path = self.rdp_dir.path_of(file);
        self.launcher.launch(&path)?;
        self.store.mark_used(id)
    }

    /// Launch a throwaway session for unsaved connection settings
    ///
    /// Writes the host, account, resolution and monitor settings of `profile`
    /// to a temporary `.rdp` file outside the profile folder, launches it,
    /// and deletes it after [`TEST_FILE_GRACE`]. Nothing is added to the
    /// store.
    pub fn test_connection(&self, profile: &Profile) -> Result<()> {
        validate(profile)?;
        let settings = Profile {
            name: TEST_CONNECTION_NAME.to_string(),
            host: profile.host.clone(),
            username: profile.username.clone(),
            domain: profile.domain.clone(),
            resolution: profile.resolution.clone(),
            use_multi_monitor: profile.use_multi_monitor,
            use_all_monitors: profile.use_all_monitors,
            ..Profile::default()
        };

        let mut file = tempfile::Builder::new()
            .prefix("temp_test_")
            .suffix(".rdp")
            .tempfile()?;
        file.write_all(codec::to_rdp_text(&settings).as_bytes())?;
        file.as_file().sync_all()?;
        let path = file.into_temp_path();
        debug!("Testing connection to {} via {}", settings.host, path.display());

        self.launcher.launch(&path)?;
        std::thread::sleep(TEST_FILE_GRACE);

        if let Err(e) = path.close() {
            warn!("Failed to delete test connection file: {}", e);
        }
        Ok(())
    }

    /// Flip the favorite flag of `id` and return the new value
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        self.store.toggle_favorite(id)
    }

    /// Profiles matching `term`, best match first
    pub fn search(&self, term: &str) -> Vec<&Profile> {
        search::search(self.store.profiles(), term)
    }

    /// Profiles in the `kind` view
    pub fn filter(&self, kind: ProfileFilter) -> Vec<&Profile> {
        search::filter(self.store.profiles(), kind)
    }

    /// Profiles in the `kind` view ranked by `term`
    pub fn query(&self, kind: ProfileFilter, term: &str) -> Vec<&Profile> {
        search::query(self.store.profiles(), kind, term)
    }

    /// The most recently used profiles, up to the configured count
    pub fn recent(&self) -> Vec<&Profile> {
        search::recent(self.store.profiles(), self.settings.recent_count)
    }

    /// Back up the metadata now, record the time in settings, and prune old
    /// backups
    pub fn backup_now(&mut self) -> Result<PathBuf> {
        let path = backup::create_backup(self.data_dir(), self.store.profiles(), Local::now())?;

        self.settings.last_backup = Some(Utc::now());
        self.settings_manager.save(&self.settings)?;

        if let Err(e) = backup::prune_backups(self.data_dir(), MAX_BACKUPS) {
            warn!("Failed to prune old backups: {}", e);
        }
        Ok(path)
    }

    /// Current settings
    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Save new settings
    ///
    /// When the profile folder changes, the new folder is opened and
    /// reconciled. When `start_with_windows` changes, start-at-login is
    /// registered or removed; a registration failure is reported, not
    /// returned.
    pub fn update_settings(&mut self, settings: AppSettings) -> Result<()> {
        let new_dir = self.settings_manager.profiles_dir(&settings);
        let folder_changed = new_dir != self.rdp_dir.root();
        let startup_changed = settings.start_with_windows != self.settings.start_with_windows;

        self.settings_manager.save(&settings)?;
        self.settings = settings;

        if startup_changed {
            self.apply_start_with_windows();
        }

        if folder_changed {
            info!("Profile folder changed to {}", new_dir.display());
            self.rdp_dir = RdpDirectory::new(new_dir)?;
            self.refresh()?;
        }
        Ok(())
    }

    fn apply_start_with_windows(&self) {
        let enabled = self.settings.start_with_windows;
        if let Err(e) = self.startup.set_enabled(enabled) {
            warn!("Failed to update start at login: {}", e);
            self.sink.notify(
                Notification::new(NotificationLevel::Warning, "Could not update start with Windows")
                    .with_detail(&e),
            );
        }
    }

    /// Show the `.rdp` file of `id` in the system file manager
    pub fn reveal(&self, id: &str) -> Result<()> {
        let file = &self.require(id)?.file;
        reveal_in_file_manager(&self.rdp_dir.path_of(file))
    }
}

fn validate(profile: &Profile) -> Result<()> {
    if profile.host.trim().is_empty() {
        return Err(RdpShelfError::InvalidProfile(
            "host must not be empty".to_string(),
        ));
    }
    Ok(())
}
