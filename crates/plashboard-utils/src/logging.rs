//! Structured logging initialization: `tracing` +
//! `tracing-subscriber`'s `EnvFilter`.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the global `tracing` subscriber from `RUST_LOG` (default
/// `info`). Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
