//! Utility modules
//!
//! Provides atomic file writes, case-insensitive JSON key matching, logging
//! initialization, and start-at-login registration.

pub mod autostart;
pub mod fs;
pub mod json;
pub mod logging;

pub use autostart::{AutoStartManager, StartupRegistration};
pub use fs::{atomic_create, atomic_write, file_stem, is_already_exists};
pub use json::{canonicalize_keys, null_as_default};
pub use logging::init_logging;
