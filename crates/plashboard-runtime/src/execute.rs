//! Single-run execution: the retry/repair loop that
//! fills, merges, validates, and (conditionally) publishes one template.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use plashboard_fill::FillContext;
use plashboard_merge::{collect_current_values, merge_values};
use plashboard_store::{RunArtifact, RunState, RunStatus, Template, Trigger};
use plashboard_utils::atomic::atomic_write_json;
use plashboard_utils::PlashboardError;
use serde_json::Value;
use tracing::{info, warn};

use crate::inner::Inner;

/// The outcome of one successful fill-merge-validate(-publish) attempt.
struct AttemptOutcome {
    published: bool,
    raw_response: Value,
}

/// Run the full pipeline for `template`, updating state and writing exactly
/// one run artifact. Always removes
/// `template.id` from the in-flight set before returning.
pub async fn execute(inner: &Inner, template: Template, trigger: Trigger) -> RunArtifact {
    let started_at = Utc::now();
    let started_at_rfc3339 = started_at.to_rfc3339();

    let _span = tracing::info_span!("run", template_id = %template.id, trigger = ?trigger).entered();

    if let Err(e) = mark_attempt_started(inner, &template.id, &started_at_rfc3339) {
        warn!(template_id = %template.id, error = %e, "failed to persist attempt start");
    }

    let retry_count = template
        .run
        .as_ref()
        .and_then(|r| r.retry_count)
        .unwrap_or(inner.config.default_retry_count);
    let repair_attempts = template.run.as_ref().and_then(|r| r.repair_attempts).unwrap_or(1);

    let mut attempt_count: u32 = 0;
    let mut last_errors: Vec<String> = Vec::new();
    let mut outcome: Option<AttemptOutcome> = None;

    match collect_current_values(&template) {
        Ok(current_values) => {
            for retry_idx in 0..=retry_count {
                attempt_count += 1;
                match attempt_with_repair(inner, &template, &current_values, repair_attempts).await
                {
                    Ok(o) => {
                        outcome = Some(o);
                        break;
                    }
                    Err(e) => {
                        last_errors = vec![e.to_string()];
                        if retry_idx < retry_count {
                            tokio::time::sleep(Duration::from_secs(
                                inner.config.retry_backoff_seconds,
                            ))
                            .await;
                        }
                    }
                }
            }
        }
        Err(e) => {
            attempt_count = 1;
            last_errors = vec![e.to_string()];
        }
    }

    let ended_at = Utc::now();
    let artifact = match outcome {
        Some(o) => {
            finalize_success(inner, &template.id, &started_at_rfc3339, &ended_at, attempt_count, o)
        }
        None => finalize_failure(
            inner,
            &template.id,
            &started_at_rfc3339,
            &ended_at,
            attempt_count,
            last_errors,
        ),
    };

    let artifact = RunArtifact {
        template_id: template.id.clone(),
        trigger,
        ..artifact
    };

    if let Err(e) = inner.runs.write(&artifact) {
        warn!(template_id = %template.id, error = %e, "failed to write run artifact");
    }

    inner.in_flight.lock().await.remove(&template.id);
    info!(
        template_id = %template.id,
        status = ?artifact.status,
        published = artifact.published,
        attempt_count = artifact.attempt_count,
        "run finished"
    );
    artifact
}

/// One retry attempt's worth of repair iterations:
/// re-invoke the fill runner with the previous failure as a hint, without
/// spending another retry, until `repair_attempts` is exhausted.
async fn attempt_with_repair(
    inner: &Inner,
    template: &Template,
    current_values: &HashMap<String, Value>,
    repair_attempts: u32,
) -> Result<AttemptOutcome, PlashboardError> {
    let mut error_hint: Option<String> = None;
    let mut last_err: Option<PlashboardError> = None;

    for attempt in 0..=repair_attempts {
        let ctx = FillContext {
            template: template.clone(),
            current_values: current_values.clone(),
            attempt,
            error_hint: error_hint.clone(),
        };
        match try_fill_merge_validate_publish(inner, template, &ctx).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) => {
                error_hint = Some(e.to_string());
                last_err = Some(e);
            }
        }
    }

    Err(last_err.expect("loop runs at least once since repair_attempts is a u32 lower-bounded at 0"))
}

/// Fill, merge, validate, write the rendered snapshot, and (iff the
/// template is the currently active one at the moment of re-load) publish.
async fn try_fill_merge_validate_publish(
    inner: &Inner,
    template: &Template,
    ctx: &FillContext,
) -> Result<AttemptOutcome, PlashboardError> {
    let response = inner.fill_backend.fill(ctx).await?;
    let merged = merge_values(template, &response.values)?;

    let profile = effective_display_profile(inner)?;
    inner
        .publisher
        .validate_only(&merged, &profile, inner.config.layout_overflow_tolerance_px)
        .await?;

    atomic_write_json(&inner.layout.rendered_latest_path(&template.id), &merged)?;

    let reloaded_state = inner.state.load()?;
    let mut published = false;
    if reloaded_state.active_template_id.as_deref() == Some(template.id.as_str()) {
        inner
            .publisher
            .publish(
                &merged,
                &profile,
                inner.config.layout_overflow_tolerance_px,
                &inner.config.dashboard_output_path,
            )
            .await?;
        published = true;
    }

    let raw_response = serde_json::to_value(&response).unwrap_or(Value::Null);
    Ok(AttemptOutcome {
        published,
        raw_response,
    })
}

fn effective_display_profile(
    inner: &Inner,
) -> Result<plashboard_utils::DisplayProfile, PlashboardError> {
    let state = inner.state.load()?;
    Ok(state.display_profile.unwrap_or(inner.config.display_profile))
}

fn mark_attempt_started(
    inner: &Inner,
    template_id: &str,
    started_at_rfc3339: &str,
) -> Result<(), PlashboardError> {
    let mut state = inner.state.load()?;
    let run_state = state.template_runs.entry(template_id.to_string()).or_default();
    run_state.last_attempt_at = Some(started_at_rfc3339.to_string());
    inner.state.save(&state)
}

fn finalize_success(
    inner: &Inner,
    template_id: &str,
    started_at: &str,
    ended_at: &chrono::DateTime<Utc>,
    attempt_count: u32,
    outcome: AttemptOutcome,
) -> RunArtifact {
    let ended_at_rfc3339 = ended_at.to_rfc3339();
    if let Err(e) = update_run_state(inner, template_id, |run_state| {
        run_state.last_success_at = Some(ended_at_rfc3339.clone());
        run_state.last_status = Some(RunStatus::Success);
        run_state.last_error = None;
    }) {
        warn!(template_id, error = %e, "failed to persist success state");
    }

    build_artifact(
        template_id,
        started_at,
        &ended_at_rfc3339,
        attempt_count,
        RunStatus::Success,
        outcome.published,
        Vec::new(),
        Some(outcome.raw_response),
    )
}

fn finalize_failure(
    inner: &Inner,
    template_id: &str,
    started_at: &str,
    ended_at: &chrono::DateTime<Utc>,
    attempt_count: u32,
    errors: Vec<String>,
) -> RunArtifact {
    let ended_at_rfc3339 = ended_at.to_rfc3339();
    let last_error = errors.last().cloned();
    if let Err(e) = update_run_state(inner, template_id, |run_state| {
        run_state.last_status = Some(RunStatus::Failed);
        run_state.last_error = last_error.clone();
    }) {
        warn!(template_id, error = %e, "failed to persist failure state");
    }

    build_artifact(
        template_id,
        started_at,
        &ended_at_rfc3339,
        attempt_count.max(1),
        RunStatus::Failed,
        false,
        errors,
        None,
    )
}

fn update_run_state(
    inner: &Inner,
    template_id: &str,
    mutate: impl FnOnce(&mut RunState),
) -> Result<(), PlashboardError> {
    let mut state = inner.state.load()?;
    let run_state = state.template_runs.entry(template_id.to_string()).or_default();
    mutate(run_state);
    inner.state.save(&state)
}

#[allow(clippy::too_many_arguments)]
fn build_artifact(
    template_id: &str,
    started_at: &str,
    ended_at: &str,
    attempt_count: u32,
    status: RunStatus,
    published: bool,
    errors: Vec<String>,
    fill_response: Option<Value>,
) -> RunArtifact {
    let duration_ms = duration_between(started_at, ended_at);
    RunArtifact {
        schema_version: plashboard_store::RUN_ARTIFACT_SCHEMA_VERSION.to_string(),
        // `trigger` is overwritten by the caller, which knows it; placeholder here.
        trigger: Trigger::Schedule,
        template_id: template_id.to_string(),
        status,
        started_at: started_at.to_string(),
        ended_at: ended_at.to_string(),
        duration_ms,
        attempt_count,
        published,
        errors,
        fill_response,
    }
}

fn duration_between(started_at: &str, ended_at: &str) -> u64 {
    let start = chrono::DateTime::parse_from_rfc3339(started_at).ok();
    let end = chrono::DateTime::parse_from_rfc3339(ended_at).ok();
    match (start, end) {
        (Some(s), Some(e)) => (e - s).num_milliseconds().max(0) as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use plashboard_config::{Config, FillProvider};
    use plashboard_fill::construct_backend_for_provider;
    use plashboard_publish::Publisher;
    use plashboard_store::{Constraints, FieldSpec, FieldType, RunParams, Schedule, ScheduleMode};
    use plashboard_utils::paths::DataLayout;
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

    fn inner_with_data_dir(data_dir: Utf8PathBuf) -> Inner {
        let writer_script = write_echo_writer(data_dir.as_std_path());
        let mut config = Config {
            data_dir: data_dir.clone(),
            dashboard_output_path: data_dir.join("dashboard.json"),
            writer_python_bin: "sh".to_string(),
            writer_script_path: writer_script,
            retry_backoff_seconds: 0,
            ..Config::default()
        };
        config.fill_provider = FillProvider::Mock;
        let layout = DataLayout::new(data_dir);
        plashboard_utils::atomic::ensure_dir_all(&layout.templates_dir()).unwrap();
        let templates = plashboard_store::TemplateStore::new(layout.clone());
        let state = plashboard_store::StateStore::new(layout.clone());
        let runs = plashboard_store::RunStore::new(layout);
        let fill_backend = construct_backend_for_provider(&config);
        let publisher = Publisher::from_config(&config);
        Inner::new(config, templates, state, runs, fill_backend, publisher)
    }

    fn empty_template(id: &str) -> Template {
        Template {
            id: id.to_string(),
            name: "Ops".to_string(),
            enabled: true,
            schedule: Schedule {
                mode: ScheduleMode::Interval,
                every_minutes: 30,
                timezone: "UTC".to_string(),
            },
            base_dashboard: json!({"title": "hello"}),
            fields: Vec::new(),
            context: None,
            run: None,
            description: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_run_publishes_when_template_is_active() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let inner = inner_with_data_dir(data_dir);

        let template = empty_template("ops");
        let mut state = inner.state.load().unwrap();
        state.active_template_id = Some("ops".to_string());
        inner.state.save(&state).unwrap();

        let artifact = execute(&inner, template, Trigger::Manual).await;
        assert_eq!(artifact.status, RunStatus::Success);
        assert!(artifact.published);
        assert_eq!(artifact.attempt_count, 1);
        assert!(inner.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn successful_run_does_not_publish_when_not_active() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let inner = inner_with_data_dir(data_dir);

        let template = empty_template("ops");
        let artifact = execute(&inner, template, Trigger::Schedule).await;
        assert_eq!(artifact.status, RunStatus::Success);
        assert!(!artifact.published);
    }

    #[tokio::test]
    async fn retry_exhaustion_produces_a_failure_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let inner = inner_with_data_dir(data_dir);

        let mut template = empty_template("ops");
        template.base_dashboard = json!({"count": 0});
        template.fields = vec![FieldSpec {
            id: "count".to_string(),
            pointer: "/count".to_string(),
            field_type: FieldType::Number,
            prompt: "count".to_string(),
            required: true,
            constraints: Constraints {
                enum_values: Some(vec![json!(999)]),
                ..Constraints::default()
            },
        }];
        template.run = Some(RunParams {
            retry_count: Some(1),
            repair_attempts: Some(0),
        });

        let artifact = execute(&inner, template, Trigger::Schedule).await;
        assert_eq!(artifact.status, RunStatus::Failed);
        assert!(!artifact.published);
        assert_eq!(artifact.attempt_count, 2);
        assert!(!artifact.errors.is_empty());
        assert!(inner.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn started_at_never_comes_after_ended_at() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let inner = inner_with_data_dir(data_dir);

        let artifact = execute(&inner, empty_template("ops"), Trigger::Schedule).await;
        let started = chrono::DateTime::parse_from_rfc3339(&artifact.started_at).unwrap();
        let ended = chrono::DateTime::parse_from_rfc3339(&artifact.ended_at).unwrap();
        assert!(started <= ended);
    }

    #[tokio::test]
    async fn run_state_is_updated_with_last_attempt_and_success() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let inner = inner_with_data_dir(data_dir);

        execute(&inner, empty_template("ops"), Trigger::Schedule).await;
        let state = inner.state.load().unwrap();
        let run_state = state.template_runs.get("ops").unwrap();
        assert!(run_state.last_attempt_at.is_some());
        assert!(run_state.last_success_at.is_some());
        assert_eq!(run_state.last_status, Some(RunStatus::Success));
    }
}
