//! `plashboard` — template-driven dashboard publishing runtime.
//!
//! The binary is a thin entrypoint; [`cli::run`] does all the work and
//! reports its own errors.

pub mod cli;

pub use plashboard_utils::exit_codes::ExitCode;
