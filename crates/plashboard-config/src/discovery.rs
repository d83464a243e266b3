//! Config discovery: search upward for `plashboard.toml`, fall back to
//! `$PLASHBOARD_HOME/config.toml`, then built-in defaults. Environment
//! variables prefixed `PLASHBOARD_` override any key by name. Precedence is
//! file, then env, then default; CLI overrides are layered on top by the
//! `plashboard` binary itself.

use std::env;

use camino::{Utf8Path, Utf8PathBuf};
use plashboard_utils::{DisplayProfile, PlashboardError};
use serde::Deserialize;

use crate::model::{Config, ConfigSource, FillProvider};

const CONFIG_FILENAME: &str = "plashboard.toml";
const ENV_PREFIX: &str = "PLASHBOARD_";

/// A partial TOML representation; every field is optional so a config file
/// only needs to mention the keys it wants to override.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_dir: Option<Utf8PathBuf>,
    dashboard_output_path: Option<Utf8PathBuf>,
    scheduler_tick_seconds: Option<u64>,
    max_parallel_runs: Option<usize>,
    default_retry_count: Option<u32>,
    retry_backoff_seconds: Option<u64>,
    session_timeout_seconds: Option<u64>,
    auto_seed_template: Option<bool>,
    fill_provider: Option<String>,
    fill_command: Option<String>,
    allow_fill_command: Option<bool>,
    openclaw_fill_agent_id: Option<String>,
    layout_overflow_tolerance_px: Option<u32>,
    writer_python_bin: Option<String>,
    writer_script_path: Option<Utf8PathBuf>,
    display_profile: Option<DisplayProfileFile>,
}

#[derive(Debug, Default, Deserialize)]
struct DisplayProfileFile {
    width_px: Option<u32>,
    height_px: Option<u32>,
    safe_top_px: Option<u32>,
    safe_bottom_px: Option<u32>,
    safe_side_px: Option<u32>,
    layout_safety_margin_px: Option<u32>,
}

/// Discover and resolve configuration, starting from `start_dir` (typically
/// the current directory).
pub fn discover(start_dir: &Utf8Path) -> Result<Config, PlashboardError> {
    let mut config = Config::default();
    for key in DEFAULT_KEYS {
        config
            .source_attribution
            .insert((*key).to_string(), ConfigSource::Default);
    }

    if let Some(path) = find_config_file(start_dir) {
        apply_file(&mut config, &path)?;
    }

    apply_env(&mut config);
    config.normalize();
    Ok(config)
}

const DEFAULT_KEYS: &[&str] = &[
    "data_dir",
    "dashboard_output_path",
    "scheduler_tick_seconds",
    "max_parallel_runs",
    "default_retry_count",
    "retry_backoff_seconds",
    "session_timeout_seconds",
    "auto_seed_template",
    "fill_provider",
    "fill_command",
    "allow_fill_command",
    "openclaw_fill_agent_id",
    "layout_overflow_tolerance_px",
    "display_profile",
];

fn find_config_file(start_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut dir = Some(start_dir.to_path_buf());
    while let Some(candidate_dir) = dir {
        let candidate = candidate_dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = candidate_dir.parent().map(Utf8Path::to_path_buf);
    }

    if let Ok(home) = env::var("PLASHBOARD_HOME") {
        let candidate = Utf8PathBuf::from(home).join("config.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    None
}

fn apply_file(config: &mut Config, path: &Utf8Path) -> Result<(), PlashboardError> {
    let text = std::fs::read_to_string(path.as_std_path()).map_err(|e| PlashboardError::Io {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| PlashboardError::ConfigInvalid {
        reason: format!("failed to parse {path}: {e}"),
    })?;

    macro_rules! take {
        ($field:ident) => {
            if let Some(v) = file.$field {
                config.$field = v;
                config
                    .source_attribution
                    .insert(stringify!($field).to_string(), ConfigSource::File);
            }
        };
    }

    take!(data_dir);
    take!(dashboard_output_path);
    take!(scheduler_tick_seconds);
    take!(max_parallel_runs);
    take!(default_retry_count);
    take!(retry_backoff_seconds);
    take!(session_timeout_seconds);
    take!(auto_seed_template);
    take!(fill_command);
    take!(allow_fill_command);
    take!(openclaw_fill_agent_id);
    take!(layout_overflow_tolerance_px);
    take!(writer_python_bin);
    take!(writer_script_path);

    if let Some(provider) = file.fill_provider {
        config.fill_provider = provider.parse::<FillProvider>().map_err(|reason| {
            PlashboardError::ConfigInvalid { reason }
        })?;
        config
            .source_attribution
            .insert("fill_provider".to_string(), ConfigSource::File);
    }

    if let Some(profile) = file.display_profile {
        config.display_profile = merge_display_profile(config.display_profile, profile);
        config
            .source_attribution
            .insert("display_profile".to_string(), ConfigSource::File);
    }

    Ok(())
}

fn merge_display_profile(mut base: DisplayProfile, file: DisplayProfileFile) -> DisplayProfile {
    if let Some(v) = file.width_px {
        base.width_px = v;
    }
    if let Some(v) = file.height_px {
        base.height_px = v;
    }
    if let Some(v) = file.safe_top_px {
        base.safe_top_px = v;
    }
    if let Some(v) = file.safe_bottom_px {
        base.safe_bottom_px = v;
    }
    if let Some(v) = file.safe_side_px {
        base.safe_side_px = v;
    }
    if let Some(v) = file.layout_safety_margin_px {
        base.layout_safety_margin_px = v;
    }
    base
}

fn apply_env(config: &mut Config) {
    macro_rules! env_override {
        ($key:literal, $field:ident, $parse:expr) => {
            if let Ok(raw) = env::var(concat!($key)) {
                if let Some(parsed) = ($parse)(raw.as_str()) {
                    config.$field = parsed;
                    config
                        .source_attribution
                        .insert(stringify!($field).to_string(), ConfigSource::Env);
                }
            }
        };
    }

    env_override!("PLASHBOARD_DATA_DIR", data_dir, |s: &str| Some(
        Utf8PathBuf::from(s)
    ));
    env_override!(
        "PLASHBOARD_SCHEDULER_TICK_SECONDS",
        scheduler_tick_seconds,
        |s: &str| s.parse().ok()
    );
    env_override!(
        "PLASHBOARD_MAX_PARALLEL_RUNS",
        max_parallel_runs,
        |s: &str| s.parse().ok()
    );
    env_override!(
        "PLASHBOARD_DEFAULT_RETRY_COUNT",
        default_retry_count,
        |s: &str| s.parse().ok()
    );
    env_override!(
        "PLASHBOARD_RETRY_BACKOFF_SECONDS",
        retry_backoff_seconds,
        |s: &str| s.parse().ok()
    );
    env_override!(
        "PLASHBOARD_SESSION_TIMEOUT_SECONDS",
        session_timeout_seconds,
        |s: &str| s.parse().ok()
    );
    env_override!(
        "PLASHBOARD_AUTO_SEED_TEMPLATE",
        auto_seed_template,
        |s: &str| s.parse().ok()
    );
    env_override!("PLASHBOARD_FILL_COMMAND", fill_command, |s: &str| Some(
        Some(s.to_string())
    ));
    env_override!(
        "PLASHBOARD_ALLOW_FILL_COMMAND",
        allow_fill_command,
        |s: &str| s.parse().ok()
    );
    env_override!(
        "PLASHBOARD_OPENCLAW_FILL_AGENT_ID",
        openclaw_fill_agent_id,
        |s: &str| Some(s.to_string())
    );
    env_override!(
        "PLASHBOARD_LAYOUT_OVERFLOW_TOLERANCE_PX",
        layout_overflow_tolerance_px,
        |s: &str| s.parse().ok()
    );
    env_override!(
        "PLASHBOARD_WRITER_PYTHON_BIN",
        writer_python_bin,
        |s: &str| Some(s.to_string())
    );
    env_override!(
        "PLASHBOARD_WRITER_SCRIPT_PATH",
        writer_script_path,
        |s: &str| Some(Utf8PathBuf::from(s))
    );

    if let Ok(raw) = env::var(format!("{ENV_PREFIX}FILL_PROVIDER")) {
        if let Ok(provider) = raw.parse::<FillProvider>() {
            config.fill_provider = provider;
            config
                .source_attribution
                .insert("fill_provider".to_string(), ConfigSource::Env);
        }
    }
}
