//! `rdpshelf` - Remote Desktop connection profile manager
//!
//! Command-line front end for the profile manager. Every command opens the
//! data directory (reconciling the profile folder on the way), performs one
//! operation and exits.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rdpshelf::{
    Profile, ProfileFilter, ProfileManager, Resolution,
    config::default_data_dir,
    error::get_user_friendly_error,
    launcher::MstscLauncher,
    notify::{Notification, NotificationLevel, NotificationSink, TracingSink},
    utils,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Manage Remote Desktop connection profiles
#[derive(Debug, Parser)]
#[command(name = "rdpshelf", version, about)]
struct Cli {
    /// Data directory (defaults to %APPDATA%\RdpShelf or $RDPSHELF_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List profiles in a view (all, favorites, recent)
    List {
        /// View to show
        #[arg(default_value = "all")]
        view: String,
    },
    /// Search profiles by name, host, account, tags and notes
    Search {
        /// Search term
        term: String,
        /// Restrict to a view before ranking
        #[arg(long, default_value = "all")]
        view: String,
    },
    /// Show the most recently used profiles
    Recent,
    /// Show one profile in full
    Show {
        /// Profile id
        id: String,
    },
    /// Create a profile and its .rdp file
    Add {
        /// Display name
        name: String,
        /// Host name or address, optionally with :port
        host: String,
        /// Account name, optionally DOMAIN\user
        #[arg(long)]
        user: Option<String>,
        /// Resolution: Auto, Fullscreen or WIDTHxHEIGHT
        #[arg(long, default_value = "Auto")]
        resolution: String,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a profile and its .rdp file
    Delete {
        /// Profile id
        id: String,
    },
    /// Launch a session
    Connect {
        /// Profile id
        id: String,
    },
    /// Launch a throwaway session without saving a profile
    Test {
        /// Host name or address, optionally with :port
        host: String,
        /// Account name, optionally DOMAIN\user
        #[arg(long)]
        user: Option<String>,
        /// Resolution: Auto, Fullscreen or WIDTHxHEIGHT
        #[arg(long, default_value = "Auto")]
        resolution: String,
    },
    /// Toggle the favorite flag
    Favorite {
        /// Profile id
        id: String,
    },
    /// Open the folder containing a profile's .rdp file
    Reveal {
        /// Profile id
        id: String,
    },
    /// Rescan the profile folder
    Reconcile,
    /// Back up the profile metadata now
    Backup,
}

/// Logs every notification and echoes errors to the terminal
struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn notify(&self, notification: Notification) {
        if let Some(line) = terminal_line(&notification) {
            eprintln!("{line}");
        }
        TracingSink.notify(notification);
    }
}

/// Text shown on stderr for error and critical notifications
fn terminal_line(notification: &Notification) -> Option<String> {
    if notification.level < NotificationLevel::Error {
        return None;
    }
    Some(match &notification.detail {
        Some(detail) => format!("{}: {} ({detail})", notification.level, notification.message),
        None => format!("{}: {}", notification.level, notification.message),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);

    utils::init_logging(&data_dir.join("logs")).context("Failed to initialize logging system")?;

    let mut manager = ProfileManager::open(
        &data_dir,
        Box::new(MstscLauncher::new()),
        Arc::new(TerminalSink),
    )
    .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;

    if let Err(e) = run(&mut manager, cli.command) {
        error!("Command failed: {:#}", e);
        if let Some(inner) = e.downcast_ref::<rdpshelf::RdpShelfError>() {
            eprintln!("{}", get_user_friendly_error(inner));
        }
        return Err(e);
    }
    Ok(())
}

fn run(manager: &mut ProfileManager, command: Command) -> Result<()> {
    match command {
        Command::List { view } => print_profiles(&manager.filter(ProfileFilter::parse(&view))),
        Command::Search { term, view } => {
            print_profiles(&manager.query(ProfileFilter::parse(&view), &term));
        }
        Command::Recent => print_profiles(&manager.recent()),
        Command::Show { id } => {
            let profile = manager
                .get(&id)
                .ok_or_else(|| rdpshelf::RdpShelfError::ProfileNotFound(id.clone()))?;
            println!("{}", serde_json::to_string_pretty(profile)?);
        }
        Command::Add {
            name,
            host,
            user,
            resolution,
            tags,
        } => {
            let mut profile = Profile::new(name, host);
            if let Some(user) = user {
                set_account(&mut profile, user);
            }
            profile.resolution = Resolution::parse(&resolution);
            for tag in &tags {
                profile.add_tag(tag);
            }
            let created = manager.create_profile(profile)?;
            println!("{}", created.id);
        }
        Command::Delete { id } => {
            if manager.delete_profile(&id)? {
                info!("Deleted {}", id);
            } else {
                println!("No profile with id {id}");
            }
        }
        Command::Connect { id } => manager.connect(&id)?,
        Command::Test {
            host,
            user,
            resolution,
        } => {
            let mut profile = Profile::new(String::new(), host);
            if let Some(user) = user {
                set_account(&mut profile, user);
            }
            profile.resolution = Resolution::parse(&resolution);
            manager.test_connection(&profile)?;
        }
        Command::Favorite { id } => {
            let favorite = manager.toggle_favorite(&id)?;
            println!("{}", if favorite { "favorite" } else { "not favorite" });
        }
        Command::Reveal { id } => manager.reveal(&id)?,
        Command::Reconcile => {
            let report = manager.refresh()?;
            println!(
                "{} added, {} skipped, {} total",
                report.added.len(),
                report.skipped.len(),
                report.total
            );
            for skipped in &report.skipped {
                println!("  skipped {}: {}", skipped.file, skipped.reason);
            }
        }
        Command::Backup => {
            let path = manager.backup_now()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Split `DOMAIN\user` into the profile's domain and username
fn set_account(profile: &mut Profile, user: String) {
    match user.split_once('\\') {
        Some((domain, username)) => {
            profile.domain = domain.to_string();
            profile.username = username.to_string();
        }
        None => profile.username = user,
    }
}

fn print_profiles(profiles: &[&Profile]) {
    for profile in profiles {
        let marker = if profile.favorite { '*' } else { ' ' };
        let account = profile.qualified_username();
        println!(
            "{marker} {:<36}  {:<24}  {:<24}  {}",
            profile.id, profile.name, profile.host, account
        );
    }
}
