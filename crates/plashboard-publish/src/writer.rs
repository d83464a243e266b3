//! Validator/publisher: wraps the external writer script
//! through the shared subprocess executor (`plashboard_fill::exec`) rather
//! than duplicating a second runner for what is, mechanically, just another
//! timed external process.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use plashboard_config::Config;
use plashboard_fill::exec::run_argv;
use plashboard_utils::{DisplayProfile, PlashboardError};
use serde_json::Value;

/// Resolved writer invocation settings, pulled out of `Config` once so the
/// executor doesn't need a full config reference per call.
pub struct Publisher {
    python_bin: String,
    script_path: Utf8PathBuf,
    timeout: Duration,
}

impl Publisher {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            python_bin: config.writer_python_bin.clone(),
            script_path: config.writer_script_path.clone(),
            timeout: Duration::from_secs(config.writer_timeout_seconds()),
        }
    }

    /// Ask the writer to validate `payload` without publishing it.
    pub async fn validate_only(
        &self,
        payload: &Value,
        profile: &DisplayProfile,
        overflow_tolerance_px: u32,
    ) -> Result<(), PlashboardError> {
        self.invoke(payload, profile, overflow_tolerance_px, &["--validate-only".to_string()], None)
            .await
    }

    /// Ask the writer to validate and publish `payload` to `live_path`.
    /// The writer performs its own atomic rename into `live_path`; this
    /// function only invokes it.
    pub async fn publish(
        &self,
        payload: &Value,
        profile: &DisplayProfile,
        overflow_tolerance_px: u32,
        live_path: &Utf8Path,
    ) -> Result<(), PlashboardError> {
        let mode_args = vec!["--output".to_string(), live_path.to_string()];
        self.invoke(payload, profile, overflow_tolerance_px, &mode_args, Some(live_path))
            .await
    }

    async fn invoke(
        &self,
        payload: &Value,
        profile: &DisplayProfile,
        overflow_tolerance_px: u32,
        mode_args: &[String],
        live_path: Option<&Utf8Path>,
    ) -> Result<(), PlashboardError> {
        let tempdir_parent = live_path
            .and_then(Utf8Path::parent)
            .unwrap_or_else(|| Utf8Path::new("."));
        plashboard_utils::atomic::ensure_dir_all(tempdir_parent)?;

        let tempdir = tempfile::Builder::new()
            .prefix(".plashboard-writer-")
            .tempdir_in(tempdir_parent.as_std_path())
            .map_err(|e| PlashboardError::Io {
                path: tempdir_parent.to_string(),
                reason: format!("failed to create writer temp directory: {e}"),
            })?;

        let input_path = Utf8PathBuf::from_path_buf(tempdir.path().join("payload.json"))
            .map_err(|p| PlashboardError::Io {
                path: p.to_string_lossy().to_string(),
                reason: "temp path is not valid UTF-8".to_string(),
            })?;
        let body = serde_json::to_vec_pretty(payload).map_err(|e| PlashboardError::Io {
            path: input_path.to_string(),
            reason: format!("failed to serialize payload: {e}"),
        })?;
        std::fs::write(input_path.as_std_path(), body).map_err(|e| PlashboardError::Io {
            path: input_path.to_string(),
            reason: e.to_string(),
        })?;

        let mut args = vec!["--input".to_string(), input_path.to_string()];
        args.extend_from_slice(mode_args);
        args.insert(0, self.script_path.to_string());

        let env = vec![
            (
                "PLASHBOARD_WRITER_VIEWPORT_HEIGHT".to_string(),
                profile.height_px.to_string(),
            ),
            (
                "PLASHBOARD_WRITER_SAFETY_MARGIN".to_string(),
                profile.layout_safety_margin_px.to_string(),
            ),
            (
                "PLASHBOARD_WRITER_OVERFLOW_TOLERANCE".to_string(),
                overflow_tolerance_px.to_string(),
            ),
            (
                "PLASHBOARD_WRITER_FRAME_TOP".to_string(),
                profile.safe_top_px.to_string(),
            ),
            (
                "PLASHBOARD_WRITER_FRAME_BOTTOM".to_string(),
                profile.safe_bottom_px.to_string(),
            ),
        ];

        let output = run_argv(&self.python_bin, &args, &env, self.timeout)
            .await
            .map_err(|e| PlashboardError::Io {
                path: self.script_path.to_string(),
                reason: e.to_string(),
            })?;

        // tempdir is removed on drop, which runs whether we return Ok or Err.
        drop(tempdir);

        if output.success() {
            return Ok(());
        }

        let stderr = output.stderr.to_lowercase();
        if stderr.contains("layout") || stderr.contains("overflow") {
            Err(PlashboardError::LayoutBudgetExceeded {
                reason: output.stderr.trim().to_string(),
            })
        } else {
            Err(PlashboardError::SchemaInvalid {
                reason: output.stderr.trim().to_string(),
            })
        }
    }
}
