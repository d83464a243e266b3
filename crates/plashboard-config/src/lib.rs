//! Configuration for `plashboard`: a flat table of tunables with
//! file > env > built-in-default precedence, plus per-key source
//! attribution for `status`.

mod discovery;
mod model;

pub use discovery::discover;
pub use model::{Config, ConfigSource, FillProvider};
