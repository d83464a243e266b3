//! Shared async subprocess executor. Used by the command
//! and agent fill providers and by the publisher's writer invocation:
//! one executor, many callers, rather than each caller rolling its own
//! spawn/timeout/kill handling. Natively async since this runtime is
//! tokio-native end to end.

use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Captured output of a finished (non-timed-out) child process.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("process timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to spawn process: {0}")]
    Spawn(String),
    #[error("failed to wait for process: {0}")]
    Wait(String),
}

/// Run an argv-style command with an environment and a hard timeout. On
/// timeout the child is killed (tokio sends it a kill signal; `kill_on_drop`
/// ensures the same happens if this future is cancelled).
pub async fn run_argv(
    program: &str,
    args: &[String],
    env: &[(String, String)],
    timeout_duration: Duration,
) -> Result<ExecOutput, ExecError> {
    let mut command = Command::new(program);
    command.args(args);
    for (key, value) in env {
        command.env(key, value);
    }
    run(command, timeout_duration).await
}

/// Run a shell string via `sh -c` (`cmd /C` on Windows). Only the `command`
/// fill provider uses this, since `fill_command` is configured as a shell
/// string rather than an argv vector; gated by `Config::allow_fill_command`
/// at the call site.
pub async fn run_shell(
    shell_command: &str,
    env: &[(String, String)],
    timeout_duration: Duration,
) -> Result<ExecOutput, ExecError> {
    let mut command = shell_command_for_platform(shell_command);
    for (key, value) in env {
        command.env(key, value);
    }
    run(command, timeout_duration).await
}

#[cfg(not(target_os = "windows"))]
fn shell_command_for_platform(shell_command: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(shell_command);
    command
}

#[cfg(target_os = "windows")]
fn shell_command_for_platform(shell_command: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(shell_command);
    command
}

async fn run(mut command: Command, timeout_duration: Duration) -> Result<ExecOutput, ExecError> {
    command
        .kill_on_drop(true)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let child = command.spawn().map_err(|e| ExecError::Spawn(e.to_string()))?;

    match timeout(timeout_duration, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        }),
        Ok(Err(e)) => Err(ExecError::Wait(e.to_string())),
        Err(_) => Err(ExecError::Timeout(timeout_duration)),
    }
}
