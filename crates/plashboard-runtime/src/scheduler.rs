//! The scheduler facade: a tick-driven loop over enabled
//! templates with bounded parallelism, plus the one-shot `run_now` path used
//! by the CLI and by `templateCreate`'s immediate-activation case.
//!
//! `Scheduler` is a thin, cheaply-cloneable handle around `Arc<Inner>`,
//! keeping the caller-facing handle lightweight and separate from the
//! heavier state it owns.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use plashboard_config::Config;
use plashboard_fill::construct_backend_for_provider;
use plashboard_publish::Publisher;
use plashboard_store::{RunArtifact, RunStore, StateStore, Template, TemplateStore, Trigger};
use plashboard_utils::paths::DataLayout;
use plashboard_utils::{DisplayProfile, PlashboardError};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api;
use crate::execute::execute;
use crate::inner::Inner;
use crate::result::ApiResult;
use crate::seed;
use crate::time::{is_due, last_attempt_at_ms};

/// The minimum tick period the scheduler will actually run at.
const MIN_TICK_SECONDS: u64 = 5;

#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Build a scheduler's shared state from a resolved `Config`. Does not
    /// touch the filesystem beyond what `Inner::new` needs; call `init`
    /// before `start` or `run_now`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let layout = DataLayout::new(config.data_dir.clone());
        let templates = TemplateStore::new(layout.clone());
        let state = StateStore::new(layout.clone());
        let runs = RunStore::new(layout);
        let fill_backend = construct_backend_for_provider(&config);
        let publisher = Publisher::from_config(&config);
        let inner = Inner::new(config, templates, state, runs, fill_backend, publisher);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Idempotent startup: ensure the data directory layout exists, load (or
    /// create) the state document, and auto-seed a starter template from a
    /// pre-existing live dashboard file.
    pub fn init(&self) -> Result<(), PlashboardError> {
        plashboard_utils::atomic::ensure_dir_all(self.inner.layout.root())?;
        plashboard_utils::atomic::ensure_dir_all(&self.inner.layout.templates_dir())?;

        // Touch the state store once so a fresh data directory gets a
        // `state.json` with defaults rather than waiting for the first write.
        let state = self.inner.state.load()?;
        self.inner.state.save(&state)?;

        seed::seed_if_needed(&self.inner)
    }

    /// Start the tick loop: one immediate tick, then one every
    /// `max(MIN_TICK_SECONDS, config.scheduler_tick_seconds)`. Returns a
    /// handle that keeps the loop alive; drop or `stop()` it to cancel.
    #[must_use]
    pub fn start(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        let period = Duration::from_secs(
            self.inner.config.scheduler_tick_seconds.max(MIN_TICK_SECONDS),
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                scheduler.tick().await;
            }
        })
    }

    /// Stop a loop previously returned by `start`.
    pub fn stop(handle: &JoinHandle<()>) {
        handle.abort();
    }

    /// One scheduling pass: find due, enabled, not-already-in-flight
    /// templates and spawn their runs without waiting for them, up to
    /// `max_parallel_runs` concurrently in flight. Reentrant calls while a
    /// previous tick's due-computation is still running are no-ops —
    /// reentrancy is forbidden.
    pub async fn tick(&self) {
        if self
            .inner
            .tick_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        self.tick_inner().await;
        self.inner.tick_in_progress.store(false, Ordering::Release);
    }

    async fn tick_inner(&self) {
        let templates = match self.inner.templates.list() {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "tick: failed to list templates");
                return;
            }
        };
        let state = match self.inner.state.load() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "tick: failed to load state");
                return;
            }
        };
        let now = chrono::Utc::now();

        let mut in_flight = self.inner.in_flight.lock().await;
        for template in templates {
            if !template.enabled {
                continue;
            }
            if in_flight.len() >= self.inner.config.max_parallel_runs {
                break;
            }
            if in_flight.contains(&template.id) {
                continue;
            }
            let due = is_due(
                last_attempt_at_ms(state.template_runs.get(&template.id)),
                template.schedule.every_minutes,
                now,
            );
            if !due {
                continue;
            }

            in_flight.insert(template.id.clone());
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                let artifact = execute(&inner, template, Trigger::Schedule).await;
                info!(
                    template_id = %artifact.template_id,
                    status = ?artifact.status,
                    "scheduled run finished"
                );
            });
        }
    }

    /// Run one template immediately, bypassing the due-time gate but not the
    /// in-flight set: a template already running fails fast with
    /// `RunInProgress` rather than queuing.
    /// Awaits the run to completion and returns its artifact.
    pub async fn run_now(&self, id: &str) -> Result<RunArtifact, PlashboardError> {
        let template = self
            .inner
            .templates
            .get(id)?
            .ok_or_else(|| PlashboardError::TemplateNotFound { id: id.to_string() })?;

        {
            let mut in_flight = self.inner.in_flight.lock().await;
            if in_flight.contains(&template.id) {
                return Err(PlashboardError::RunInProgress { id: template.id });
            }
            in_flight.insert(template.id.clone());
        }

        Ok(execute(&self.inner, template, Trigger::Manual).await)
    }

    pub async fn template_create(&self, candidate: Value) -> ApiResult<Template> {
        api::template_create(&self.inner, candidate).await
    }

    pub async fn template_copy(
        &self,
        src_id: &str,
        dst_id: &str,
        new_name: Option<String>,
        activate: bool,
    ) -> ApiResult<Template> {
        api::template_copy(&self.inner, src_id, dst_id, new_name, activate).await
    }

    pub fn template_delete(&self, id: &str) -> ApiResult<()> {
        api::template_delete(&self.inner, id)
    }

    pub fn template_list(&self) -> Result<Vec<Template>, PlashboardError> {
        self.inner.templates.list()
    }

    pub fn template_get(&self, id: &str) -> Result<Option<Template>, PlashboardError> {
        api::template_get(&self.inner, id)
    }

    pub fn template_activate(&self, id: &str) -> ApiResult<()> {
        api::template_activate(&self.inner, id)
    }

    pub fn display_profile_set(
        &self,
        patch: plashboard_utils::DisplayProfilePatch,
    ) -> ApiResult<DisplayProfile> {
        api::display_profile_set(&self.inner, patch)
    }

    pub async fn status(&self) -> ApiResult<api::StatusSnapshot> {
        api::status(&self.inner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use plashboard_config::FillProvider;
    use serde_json::json;

    fn write_echo_writer(dir: &std::path::Path) -> Utf8PathBuf {
        let script = dir.join("writer.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&script).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&script, perms).unwrap();
        }
        Utf8PathBuf::from_path_buf(script).unwrap()
    }

    fn scheduler_in(data_dir: Utf8PathBuf) -> Scheduler {
        let writer_script = write_echo_writer(data_dir.as_std_path());
        let mut config = Config {
            data_dir: data_dir.clone(),
            dashboard_output_path: data_dir.join("dashboard.json"),
            writer_python_bin: "sh".to_string(),
            writer_script_path: writer_script,
            ..Config::default()
        };
        config.fill_provider = FillProvider::Mock;
        Scheduler::new(config)
    }

    #[tokio::test]
    async fn init_is_idempotent_and_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let scheduler = scheduler_in(data_dir);
        scheduler.init().unwrap();
        scheduler.init().unwrap();
        assert!(scheduler.inner.layout.state_path().exists());
    }

    #[tokio::test]
    async fn run_now_executes_immediately_and_returns_an_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let scheduler = scheduler_in(data_dir);
        scheduler.init().unwrap();

        let create = scheduler
            .template_create(json!({
                "id": "ops",
                "name": "Ops",
                "enabled": true,
                "schedule": {"mode": "interval", "every_minutes": 30, "timezone": "UTC"},
                "base_dashboard": {"title": "hello"},
                "fields": [],
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z",
            }))
            .await;
        assert!(create.ok, "errors: {:?}", create.errors);

        let artifact = scheduler.run_now("ops").await.unwrap();
        assert_eq!(artifact.template_id, "ops");
        assert!(matches!(artifact.trigger, Trigger::Manual));
        assert!(scheduler.inner.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn run_now_fails_fast_when_already_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let scheduler = scheduler_in(data_dir);
        scheduler.init().unwrap();

        scheduler
            .template_create(json!({
                "id": "ops",
                "name": "Ops",
                "enabled": true,
                "schedule": {"mode": "interval", "every_minutes": 30, "timezone": "UTC"},
                "base_dashboard": {"title": "hello"},
                "fields": [],
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z",
            }))
            .await;

        scheduler.inner.in_flight.lock().await.insert("ops".to_string());
        let err = scheduler.run_now("ops").await.unwrap_err();
        assert!(matches!(err, PlashboardError::RunInProgress { .. }));
    }

    #[tokio::test]
    async fn run_now_rejects_unknown_template() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let scheduler = scheduler_in(data_dir);
        scheduler.init().unwrap();

        let err = scheduler.run_now("ghost").await.unwrap_err();
        assert!(matches!(err, PlashboardError::TemplateNotFound { .. }));
    }

    #[tokio::test]
    async fn tick_skips_a_disabled_template() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let scheduler = scheduler_in(data_dir);
        scheduler.init().unwrap();

        let mut disabled = json!({
            "id": "ops",
            "name": "Ops",
            "enabled": false,
            "schedule": {"mode": "interval", "every_minutes": 30, "timezone": "UTC"},
            "base_dashboard": {"title": "hello"},
            "fields": [],
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
        });
        disabled["enabled"] = json!(false);
        scheduler.template_create(disabled).await;

        scheduler.tick().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(scheduler.inner.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_ticks_do_not_reenter() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let scheduler = scheduler_in(data_dir);
        scheduler.init().unwrap();

        scheduler.inner.tick_in_progress.store(true, Ordering::Release);
        // A tick that finds reentrancy already set returns immediately
        // without touching the in-flight set.
        scheduler.tick().await;
        assert!(scheduler.inner.in_flight.lock().await.is_empty());
        scheduler.inner.tick_in_progress.store(false, Ordering::Release);
    }
}
