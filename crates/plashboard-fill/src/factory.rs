//! Provider dispatch: `construct_backend_for_provider` selects the
//! configured `FillBackend` implementation.

use std::time::Duration;

use plashboard_config::{Config, FillProvider};

use crate::agent::AgentBackend;
use crate::backend::FillBackend;
use crate::command::CommandBackend;
use crate::mock::MockBackend;

/// Build the fill backend selected by `config.fill_provider`.
#[must_use]
pub fn construct_backend_for_provider(config: &Config) -> Box<dyn FillBackend> {
    match config.fill_provider {
        FillProvider::Mock => Box::new(MockBackend),
        FillProvider::Command => Box::new(CommandBackend {
            command: config.fill_command.clone(),
            allowed: config.allow_fill_command,
            timeout: Duration::from_secs(config.session_timeout_seconds),
        }),
        FillProvider::Openclaw => Box::new(AgentBackend::new(
            config.openclaw_fill_agent_id.clone(),
            config.session_timeout_seconds,
        )),
    }
}
