//! The external-command fill provider.
//!
//! **Security note:** `fill_command` is configured as a shell string, not
//! an argv vector, and must be spawned as one — an external requirement,
//! not a choice we're free to harden away. This is the one place in the
//! codebase that shells out, and it stays behind `Config::allow_fill_command`.

use std::time::Duration;

use async_trait::async_trait;
use plashboard_merge::parse_fill_response;
use plashboard_merge::FillResponse;
use plashboard_utils::PlashboardError;

use crate::backend::FillBackend;
use crate::context::{build_prompt, FillContext};
use crate::exec::run_shell;
use crate::output_parser::extract_fill_value;

const PROVIDER_NAME: &str = "command";
const PROMPT_ENV_VAR: &str = "PLASHBOARD_PROMPT_JSON";

pub struct CommandBackend {
    pub command: Option<String>,
    pub allowed: bool,
    pub timeout: Duration,
}

#[async_trait]
impl FillBackend for CommandBackend {
    async fn fill(&self, ctx: &FillContext) -> Result<FillResponse, PlashboardError> {
        if !self.allowed {
            return Err(PlashboardError::FillProviderError {
                provider: PROVIDER_NAME.to_string(),
                reason: "command fill provider is disabled (allow_fill_command=false)".to_string(),
            });
        }
        let command = self.command.as_ref().ok_or_else(|| PlashboardError::FillProviderError {
            provider: PROVIDER_NAME.to_string(),
            reason: "fill_command is not configured".to_string(),
        })?;

        let prompt = build_prompt(ctx);
        let prompt_json = serde_json::to_string(&prompt).map_err(|e| PlashboardError::FillProviderError {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("failed to serialize prompt: {e}"),
        })?;

        let env = vec![(PROMPT_ENV_VAR.to_string(), prompt_json)];
        let output = run_shell(command, &env, self.timeout)
            .await
            .map_err(|e| PlashboardError::FillProviderError {
                provider: PROVIDER_NAME.to_string(),
                reason: e.to_string(),
            })?;

        if !output.success() {
            return Err(PlashboardError::FillProviderError {
                provider: PROVIDER_NAME.to_string(),
                reason: format!(
                    "command exited with {:?}: {}",
                    output.exit_code,
                    output.stderr.trim()
                ),
            });
        }

        let extracted = extract_fill_value(&output.stdout).ok_or_else(|| PlashboardError::FillParseError {
            provider: PROVIDER_NAME.to_string(),
            reason: "no JSON values object found in command output".to_string(),
        })?;

        parse_fill_response(&extracted, PROVIDER_NAME)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
