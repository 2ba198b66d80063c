//! Profile data models
//!
//! A [`Profile`] combines the connection settings stored in its `.rdp` file
//! with the metadata kept in `profiles.json` (tags, notes, favorite flag,
//! usage timestamps).

use crate::utils::null_as_default;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Host assigned to profiles whose `.rdp` file has no `full address`
pub const DEFAULT_HOST: &str = "localhost";

/// JSON field names of [`Profile`], used for case-insensitive matching on read
pub const PROFILE_FIELDS: &[&str] = &[
    "id",
    "name",
    "file",
    "host",
    "username",
    "domain",
    "resolution",
    "notes",
    "tags",
    "lastUsed",
    "favorite",
    "createdAt",
    "useMultiMonitor",
    "useAllMonitors",
];

/// Generate a fresh profile identifier (UUID v4, hyphenated)
pub fn generate_profile_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Read an id, generating one for `null` or blank values
fn id_or_generated<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(generate_profile_id))
}

/// Display resolution for a connection
///
/// Serialized as its display string: `"Auto"`, `"Fullscreen"`, `"1920x1080"`,
/// or whatever text the user entered when it is not a valid size.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Resolution {
    /// Windowed session sized by the client, with smart sizing
    #[default]
    Auto,
    /// Full-screen session
    Fullscreen,
    /// Explicit desktop size in pixels
    Fixed {
        /// Desktop width
        width: u32,
        /// Desktop height
        height: u32,
    },
    /// Unrecognized text, kept verbatim and ignored when writing `.rdp` files
    Other(String),
}

impl Resolution {
    /// Parse a resolution string
    ///
    /// Matching is case-insensitive. `"full"` is accepted as a synonym for
    /// fullscreen. `WIDTHxHEIGHT` needs two positive integers; anything else
    /// becomes [`Resolution::Other`].
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "auto" => Self::Auto,
            "full" | "fullscreen" => Self::Fullscreen,
            _ => lower
                .split_once('x')
                .and_then(|(w, h)| Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?)))
                .filter(|&(width, height)| width > 0 && height > 0)
                .map_or_else(
                    || Self::Other(trimmed.to_string()),
                    |(width, height)| Self::Fixed { width, height },
                ),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("Auto"),
            Self::Fullscreen => f.write_str("Fullscreen"),
            Self::Fixed { width, height } => write!(f, "{width}x{height}"),
            Self::Other(text) => f.write_str(text),
        }
    }
}

impl From<String> for Resolution {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<Resolution> for String {
    fn from(resolution: Resolution) -> Self {
        resolution.to_string()
    }
}

/// One remote-desktop connection definition
///
/// On read, a `null` in any field is treated like a missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Unique identifier, immutable after creation
    #[serde(default = "generate_profile_id", deserialize_with = "id_or_generated")]
    pub id: String,
    /// Display name
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Name of the backing `.rdp` file inside the profile directory
    #[serde(deserialize_with = "null_as_default")]
    pub file: String,
    /// Target hostname or IP address, optionally with `:port`
    #[serde(deserialize_with = "null_as_default")]
    pub host: String,
    /// Account name (the secret itself lives in the OS credential vault)
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    /// Windows domain, empty for local accounts
    #[serde(deserialize_with = "null_as_default")]
    pub domain: String,
    /// Display resolution
    #[serde(deserialize_with = "null_as_default")]
    pub resolution: Resolution,
    /// Free-text notes
    #[serde(deserialize_with = "null_as_default")]
    pub notes: String,
    /// Free-text labels, matched case-insensitively
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Time of the last successful connect
    #[serde(with = "super::timestamp::lenient_option")]
    pub last_used: Option<DateTime<Utc>>,
    /// Favorite flag
    #[serde(deserialize_with = "null_as_default")]
    pub favorite: bool,
    /// Creation time
    #[serde(with = "super::timestamp::lenient")]
    pub created_at: DateTime<Utc>,
    /// Use multiple monitors
    #[serde(deserialize_with = "null_as_default")]
    pub use_multi_monitor: bool,
    /// Span the desktop across all monitors
    #[serde(deserialize_with = "null_as_default")]
    pub use_all_monitors: bool,
}

impl Default for Profile {
    /// An empty profile with a blank id, as produced by the `.rdp` decoder
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            file: String::new(),
            host: String::new(),
            username: String::new(),
            domain: String::new(),
            resolution: Resolution::Auto,
            notes: String::new(),
            tags: Vec::new(),
            last_used: None,
            favorite: false,
            created_at: Utc::now(),
            use_multi_monitor: false,
            use_all_monitors: false,
        }
    }
}

impl Profile {
    /// Create a profile with a fresh id
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            id: generate_profile_id(),
            name: name.into(),
            host: host.into(),
            ..Self::default()
        }
    }

    /// `DOMAIN\user` when a domain is set, otherwise the bare username
    pub fn qualified_username(&self) -> String {
        if self.domain.is_empty() {
            self.username.clone()
        } else {
            format!("{}\\{}", self.domain, self.username)
        }
    }

    /// Whether any tag equals `tag`, ignoring case
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Add a trimmed tag unless an equal one (ignoring case) is present
    ///
    /// Returns `true` when the tag was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove every tag equal to `tag`, ignoring case
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| !t.eq_ignore_ascii_case(tag));
    }
}
