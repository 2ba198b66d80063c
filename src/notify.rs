//! User-facing notifications
//!
//! Failures that are swallowed rather than returned (a corrupt metadata
//! document, an unreadable `.rdp` file during reconciliation, a failed
//! automatic backup) are reported through a [`NotificationSink`]. The sink is
//! passed to the store and the manager at construction; there is no global
//! instance.

use parking_lot::Mutex;
use std::fmt;
use std::sync::mpsc;
use tracing::{error, info, warn};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotificationLevel {
    /// Informational message
    Info,
    /// Something was skipped or defaulted
    Warning,
    /// An operation failed
    Error,
    /// Data may have been lost
    Critical,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Short, user-readable message
    pub message: String,
    /// Technical detail (error text, file name)
    pub detail: Option<String>,
}

impl Notification {
    /// Create a notification without detail
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            detail: None,
        }
    }

    /// Attach technical detail
    #[must_use]
    pub fn with_detail(mut self, detail: impl fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

/// Receiver of notifications
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        let detail = notification.detail.as_deref().unwrap_or("");
        match notification.level {
            NotificationLevel::Info => info!("{} {}", notification.message, detail),
            NotificationLevel::Warning => warn!("{} {}", notification.message, detail),
            NotificationLevel::Error | NotificationLevel::Critical => {
                error!(
                    "[{}] {} {}",
                    notification.level, notification.message, detail
                );
            }
        }
    }
}

/// Collects notifications in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    notifications: Mutex<Vec<Notification>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything collected so far
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock())
    }

    /// Copy of everything collected so far
    pub fn snapshot(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    /// Number of notifications at `level` or above
    pub fn count_at_least(&self, level: NotificationLevel) -> usize {
        self.notifications
            .lock()
            .iter()
            .filter(|n| n.level >= level)
            .count()
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

/// Forwards notifications over a bounded channel, e.g. to a UI thread
///
/// Notifications are dropped (with a log line) when the channel is full or
/// the receiver is gone; the sender never blocks.
#[derive(Debug)]
pub struct ChannelSink {
    sender: mpsc::SyncSender<Notification>,
}

impl ChannelSink {
    /// Wrap the sending half of a `sync_channel`
    pub fn new(sender: mpsc::SyncSender<Notification>) -> Self {
        Self { sender }
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.sender.try_send(notification) {
            warn!("Dropping notification: {}", e);
        }
    }
}
