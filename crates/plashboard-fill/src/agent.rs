//! The `openclaw` agent-call fill provider: invokes an external
//! agent binary with `--agent <id> --message <text> --json --timeout
//! <seconds>`, outer timeout `session_timeout_seconds + 30`.

use std::time::Duration;

use async_trait::async_trait;
use plashboard_merge::parse_fill_response;
use plashboard_merge::FillResponse;
use plashboard_utils::PlashboardError;

use crate::backend::FillBackend;
use crate::context::{build_prompt, FillContext};
use crate::exec::run_argv;
use crate::output_parser::extract_fill_value;

const PROVIDER_NAME: &str = "openclaw";
const DEFAULT_AGENT_BINARY: &str = "openclaw-agent";

pub struct AgentBackend {
    pub agent_binary: String,
    pub agent_id: String,
    pub inner_timeout_seconds: u64,
}

impl AgentBackend {
    #[must_use]
    pub fn new(agent_id: String, inner_timeout_seconds: u64) -> Self {
        Self {
            agent_binary: DEFAULT_AGENT_BINARY.to_string(),
            agent_id,
            inner_timeout_seconds,
        }
    }

    fn outer_timeout(&self) -> Duration {
        Duration::from_secs(self.inner_timeout_seconds + 30)
    }
}

#[async_trait]
impl FillBackend for AgentBackend {
    async fn fill(&self, ctx: &FillContext) -> Result<FillResponse, PlashboardError> {
        let prompt = build_prompt(ctx);
        let message = serde_json::to_string(&prompt).map_err(|e| PlashboardError::FillProviderError {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("failed to serialize prompt: {e}"),
        })?;

        let args = vec![
            "--agent".to_string(),
            self.agent_id.clone(),
            "--message".to_string(),
            message,
            "--json".to_string(),
            "--timeout".to_string(),
            self.inner_timeout_seconds.to_string(),
        ];

        let output = run_argv(&self.agent_binary, &args, &[], self.outer_timeout())
            .await
            .map_err(|e| PlashboardError::FillProviderError {
                provider: PROVIDER_NAME.to_string(),
                reason: e.to_string(),
            })?;

        if !output.success() {
            return Err(PlashboardError::FillProviderError {
                provider: PROVIDER_NAME.to_string(),
                reason: format!(
                    "agent exited with {:?}: {}",
                    output.exit_code,
                    output.stderr.trim()
                ),
            });
        }

        let extracted = extract_fill_value(&output.stdout).ok_or_else(|| PlashboardError::FillParseError {
            provider: PROVIDER_NAME.to_string(),
            reason: "no JSON values object found in agent output".to_string(),
        })?;

        parse_fill_response(&extracted, PROVIDER_NAME)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
