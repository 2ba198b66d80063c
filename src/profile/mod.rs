//! Connection profiles
//!
//! A profile is split across two places: its `.rdp` file in the profile
//! directory (connection settings, see [`codec`] and [`files`]) and its entry
//! in `profiles.json` (metadata, see [`store`]). Reconciliation adopts `.rdp`
//! files that have no metadata yet.

pub mod codec;
pub mod files;
pub mod models;
pub mod search;
pub mod store;
pub mod timestamp;

pub use codec::RdpFileSettings;
pub use files::RdpDirectory;
pub use models::{Profile, Resolution};
pub use search::ProfileFilter;
pub use store::{LoadOutcome, ProfileStore, ReconcileReport, SkippedFile};
