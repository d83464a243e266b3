//! The `Config` model: one field per row of the configuration table.

use std::collections::HashMap;

use camino::Utf8PathBuf;
use plashboard_utils::DisplayProfile;
use serde::{Deserialize, Serialize};

/// Where a resolved config value came from; surfaced by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    File,
    Env,
}

/// Fill provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillProvider {
    Mock,
    Command,
    Openclaw,
}

impl Default for FillProvider {
    fn default() -> Self {
        Self::Openclaw
    }
}

impl std::str::FromStr for FillProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mock" => Ok(Self::Mock),
            "command" => Ok(Self::Command),
            "openclaw" => Ok(Self::Openclaw),
            other => Err(format!(
                "unknown fill_provider '{other}'; expected mock, command, or openclaw"
            )),
        }
    }
}

/// Resolved configuration for one `plashboard` process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: Utf8PathBuf,
    pub dashboard_output_path: Utf8PathBuf,
    pub scheduler_tick_seconds: u64,
    pub max_parallel_runs: usize,
    pub default_retry_count: u32,
    pub retry_backoff_seconds: u64,
    pub session_timeout_seconds: u64,
    pub auto_seed_template: bool,
    pub fill_provider: FillProvider,
    pub fill_command: Option<String>,
    pub allow_fill_command: bool,
    pub openclaw_fill_agent_id: String,
    pub display_profile: DisplayProfile,
    pub layout_overflow_tolerance_px: u32,

    /// Writer protocol: `<writer_python_bin> <writer_script_path>
    /// --input <file> [--validate-only | --output <live>]`. Not itself a
    /// tunable in the configuration table but required to invoke the
    /// writer protocol the table does name.
    pub writer_python_bin: String,
    pub writer_script_path: Utf8PathBuf,

    #[serde(default)]
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = Utf8PathBuf::from("/var/lib/openclaw/plash-data");
        let dashboard_output_path = data_dir.join("dashboard.json");
        let writer_script_path = data_dir.join("writer/writer.py");
        Self {
            data_dir,
            dashboard_output_path,
            scheduler_tick_seconds: 30,
            max_parallel_runs: 1,
            default_retry_count: 1,
            retry_backoff_seconds: 20,
            session_timeout_seconds: 90,
            auto_seed_template: true,
            fill_provider: FillProvider::default(),
            fill_command: None,
            allow_fill_command: false,
            openclaw_fill_agent_id: "main".to_string(),
            display_profile: DisplayProfile::default(),
            layout_overflow_tolerance_px: 40,
            writer_python_bin: "python3".to_string(),
            writer_script_path,
            source_attribution: HashMap::new(),
        }
    }
}

impl Config {
    /// Enforce the documented minimums ("min 5", "min 1", ...). Called
    /// once after every layer (file, env, CLI) has been applied.
    pub fn normalize(&mut self) {
        self.scheduler_tick_seconds = self.scheduler_tick_seconds.max(5);
        self.max_parallel_runs = self.max_parallel_runs.max(1);
        self.retry_backoff_seconds = self.retry_backoff_seconds.max(1);
        self.session_timeout_seconds = self.session_timeout_seconds.max(10);
        if self.dashboard_output_path.as_str().is_empty() {
            self.dashboard_output_path = self.data_dir.join("dashboard.json");
        }
    }

    /// The timeout the publisher's writer subprocess must respect: the
    /// greater of 15s and the session timeout.
    #[must_use]
    pub fn writer_timeout_seconds(&self) -> u64 {
        self.session_timeout_seconds.max(15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = Config::default();
        assert_eq!(cfg.scheduler_tick_seconds, 30);
        assert_eq!(cfg.max_parallel_runs, 1);
        assert_eq!(cfg.default_retry_count, 1);
        assert_eq!(cfg.retry_backoff_seconds, 20);
        assert_eq!(cfg.session_timeout_seconds, 90);
        assert!(cfg.auto_seed_template);
        assert_eq!(cfg.fill_provider, FillProvider::Openclaw);
        assert_eq!(cfg.layout_overflow_tolerance_px, 40);
    }

    #[test]
    fn normalize_enforces_minimums() {
        let mut cfg = Config {
            scheduler_tick_seconds: 1,
            max_parallel_runs: 0,
            retry_backoff_seconds: 0,
            session_timeout_seconds: 1,
            ..Config::default()
        };
        cfg.normalize();
        assert_eq!(cfg.scheduler_tick_seconds, 5);
        assert_eq!(cfg.max_parallel_runs, 1);
        assert_eq!(cfg.retry_backoff_seconds, 1);
        assert_eq!(cfg.session_timeout_seconds, 10);
    }

    #[test]
    fn writer_timeout_is_at_least_fifteen_seconds() {
        let mut cfg = Config {
            session_timeout_seconds: 5,
            ..Config::default()
        };
        cfg.normalize();
        assert_eq!(cfg.writer_timeout_seconds(), 15);

        let cfg_long = Config {
            session_timeout_seconds: 120,
            ..Config::default()
        };
        assert_eq!(cfg_long.writer_timeout_seconds(), 120);
    }

    #[test]
    fn fill_provider_parses_from_str() {
        assert_eq!("mock".parse::<FillProvider>().unwrap(), FillProvider::Mock);
        assert!("bogus".parse::<FillProvider>().is_err());
    }
}
