//! Ambient utilities shared by every `plashboard` crate: atomic file I/O,
//! the error taxonomy, exit codes, filesystem layout helpers, and logging
//! initialization.

pub mod atomic;
pub mod display_profile;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod paths;

pub use display_profile::{DisplayProfile, DisplayProfilePatch};
pub use error::PlashboardError;
