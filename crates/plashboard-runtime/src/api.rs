//! The runtime API surface: template CRUD, activation, display
//! profile mutation, and status. Every operation validates before it
//! mutates anything on disk and returns the uniform `ApiResult` envelope.

use chrono::Utc;
use plashboard_merge::{validate_field_pointers, validate_template_shape};
use plashboard_store::{validate_id, RuntimeState, Template};
use plashboard_utils::{DisplayProfile, DisplayProfilePatch, PlashboardError};
use serde_json::Value;

use crate::inner::Inner;
use crate::result::ApiResult;

/// `templateCreate`: shape, then pointer, then publishability
/// (checked by the caller via `Publisher::validate_only` — see
/// `validate_publishability`). If accepted and no template is active yet,
/// the new template becomes active.
pub async fn template_create(inner: &Inner, candidate: Value) -> ApiResult<Template> {
    let mut errors = validate_template_shape(&candidate);
    if !errors.is_empty() {
        return ApiResult::err(errors);
    }

    let template: Template = match serde_json::from_value(candidate) {
        Ok(t) => t,
        Err(e) => return ApiResult::err_one(format!("failed to parse template: {e}")),
    };

    if let Err(e) = validate_id(&template.id) {
        return ApiResult::err_one(e.to_string());
    }
    match inner.templates.get(&template.id) {
        Ok(Some(_)) => {
            return ApiResult::err_one(
                PlashboardError::TemplateConflict { id: template.id.clone() }.to_string(),
            );
        }
        Ok(None) => {}
        Err(e) => return ApiResult::err_one(e.to_string()),
    }

    if let Err(e) = validate_field_pointers(&template) {
        return ApiResult::err_one(e.to_string());
    }
    if let Err(e) = validate_publishability(inner, &template).await {
        errors.push(e);
        return ApiResult::err(errors);
    }

    let now = Utc::now().to_rfc3339();
    let template = Template {
        created_at: now.clone(),
        updated_at: now,
        ..template
    };

    if let Err(e) = inner.templates.upsert(&template) {
        return ApiResult::err_one(e.to_string());
    }

    if let Err(e) = activate_if_none_active(inner, &template.id) {
        return ApiResult::err_one(e.to_string());
    }

    ApiResult::ok(template)
}

/// `templateCopy`.
pub async fn template_copy(
    inner: &Inner,
    src_id: &str,
    dst_id: &str,
    new_name: Option<String>,
    activate: bool,
) -> ApiResult<Template> {
    if let Err(e) = validate_id(dst_id) {
        return ApiResult::err_one(e.to_string());
    }
    let source = match inner.templates.get(src_id) {
        Ok(Some(t)) => t,
        Ok(None) => {
            return ApiResult::err_one(
                PlashboardError::TemplateNotFound { id: src_id.to_string() }.to_string(),
            )
        }
        Err(e) => return ApiResult::err_one(e.to_string()),
    };
    match inner.templates.get(dst_id) {
        Ok(Some(_)) => {
            return ApiResult::err_one(
                PlashboardError::TemplateConflict { id: dst_id.to_string() }.to_string(),
            )
        }
        Ok(None) => {}
        Err(e) => return ApiResult::err_one(e.to_string()),
    }

    let now = Utc::now().to_rfc3339();
    let copy = Template {
        id: dst_id.to_string(),
        name: new_name.unwrap_or_else(|| format!("{} Copy", source.name)),
        created_at: now.clone(),
        updated_at: now,
        ..source
    };

    if let Err(e) = inner.templates.upsert(&copy) {
        return ApiResult::err_one(e.to_string());
    }

    let should_activate = match inner.state.load() {
        Ok(state) => activate || state.active_template_id.is_none(),
        Err(e) => return ApiResult::err_one(e.to_string()),
    };
    if should_activate {
        if let Err(e) = set_active(inner, Some(copy.id.clone())) {
            return ApiResult::err_one(e.to_string());
        }
    }

    ApiResult::ok(copy)
}

/// `templateGet`: looks up a single template by id.
pub fn template_get(inner: &Inner, id: &str) -> Result<Option<Template>, PlashboardError> {
    validate_id(id)?;
    inner.templates.get(id)
}

/// `templateDelete`: reassigns `active_template_id` to the
/// first remaining template (ascending id) or null.
pub fn template_delete(inner: &Inner, id: &str) -> ApiResult<()> {
    if let Err(e) = validate_id(id) {
        return ApiResult::err_one(e.to_string());
    }
    if let Err(e) = inner.templates.remove(id) {
        return ApiResult::err_one(e.to_string());
    }

    let mut state = match inner.state.load() {
        Ok(s) => s,
        Err(e) => return ApiResult::err_one(e.to_string()),
    };
    state.template_runs.remove(id);

    if state.active_template_id.as_deref() == Some(id) {
        let remaining = match inner.templates.list() {
            Ok(list) => list,
            Err(e) => return ApiResult::err_one(e.to_string()),
        };
        state.active_template_id = remaining.first().map(|t| t.id.clone());
    }

    if let Err(e) = inner.state.save(&state) {
        return ApiResult::err_one(e.to_string());
    }
    ApiResult::ok(())
}

/// `templateActivate`: changes `active_template_id` only; never
/// triggers a run. Activation is purely observational until the next
/// tick or an explicit `run_now`.
pub fn template_activate(inner: &Inner, id: &str) -> ApiResult<()> {
    if let Err(e) = validate_id(id) {
        return ApiResult::err_one(e.to_string());
    }
    match inner.templates.get(id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return ApiResult::err_one(
                PlashboardError::TemplateNotFound { id: id.to_string() }.to_string(),
            )
        }
        Err(e) => return ApiResult::err_one(e.to_string()),
    }
    match set_active(inner, Some(id.to_string())) {
        Ok(()) => ApiResult::ok(()),
        Err(e) => ApiResult::err_one(e.to_string()),
    }
}

/// `displayProfileSet`: partial merge over the current
/// effective profile, clamped, persisted into state.
pub fn display_profile_set(inner: &Inner, patch: DisplayProfilePatch) -> ApiResult<DisplayProfile> {
    let mut state = match inner.state.load() {
        Ok(s) => s,
        Err(e) => return ApiResult::err_one(e.to_string()),
    };
    let current = state.display_profile.unwrap_or(inner.config.display_profile);
    let updated = current.merge_patch(patch);
    state.display_profile = Some(updated);
    match inner.state.save(&state) {
        Ok(()) => ApiResult::ok(updated),
        Err(e) => ApiResult::err_one(e.to_string()),
    }
}

/// Status snapshot.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusSnapshot {
    pub active_template_id: Option<String>,
    pub template_count: usize,
    pub enabled_count: usize,
    pub in_flight: Vec<String>,
    pub state: RuntimeState,
}

pub async fn status(inner: &Inner) -> ApiResult<StatusSnapshot> {
    let templates = match inner.templates.list() {
        Ok(t) => t,
        Err(e) => return ApiResult::err_one(e.to_string()),
    };
    let state = match inner.state.load() {
        Ok(s) => s,
        Err(e) => return ApiResult::err_one(e.to_string()),
    };
    let in_flight: Vec<String> = inner.in_flight.lock().await.iter().cloned().collect();

    ApiResult::ok(StatusSnapshot {
        active_template_id: state.active_template_id.clone(),
        template_count: templates.len(),
        enabled_count: templates.iter().filter(|t| t.enabled).count(),
        in_flight,
        state,
    })
}

fn set_active(inner: &Inner, id: Option<String>) -> Result<(), PlashboardError> {
    let mut state = inner.state.load()?;
    state.active_template_id = id;
    inner.state.save(&state)
}

fn activate_if_none_active(
    inner: &Inner,
    id: &str,
) -> Result<(), PlashboardError> {
    let state = inner.state.load()?;
    if state.active_template_id.is_none() {
        set_active(inner, Some(id.to_string()))?;
    }
    Ok(())
}

/// A template must publish its skeleton as-is.
async fn validate_publishability(inner: &Inner, template: &Template) -> Result<(), String> {
    let profile = inner
        .state
        .load()
        .map(|s| s.display_profile.unwrap_or(inner.config.display_profile))
        .unwrap_or(inner.config.display_profile);

    inner
        .publisher
        .validate_only(
            &template.base_dashboard,
            &profile,
            inner.config.layout_overflow_tolerance_px,
        )
        .await
        .map_err(|e| format!("base_dashboard failed publishability check: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use plashboard_config::{Config, FillProvider};
    use plashboard_fill::construct_backend_for_provider;
    use plashboard_store::{RunStore, StateStore, TemplateStore};
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
            ..Config::default()
        };
        config.fill_provider = FillProvider::Mock;
        let layout = DataLayout::new(data_dir);
        let templates = TemplateStore::new(layout.clone());
        let state = StateStore::new(layout.clone());
        let runs = RunStore::new(layout);
        let fill_backend = construct_backend_for_provider(&config);
        let publisher = Publisher::from_config(&config);
        Inner::new(config, templates, state, runs, fill_backend, publisher)
    }

    fn candidate(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Ops",
            "enabled": true,
            "schedule": {"mode": "interval", "every_minutes": 30, "timezone": "UTC"},
            "base_dashboard": {"title": "hello"},
            "fields": [],
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
        })
    }

    fn new_inner() -> (tempfile::TempDir, Inner) {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let inner = inner_with_data_dir(data_dir);
        (dir, inner)
    }

    #[tokio::test]
    async fn template_create_succeeds_and_auto_activates_when_none_active() {
        let (_dir, inner) = new_inner();
        let result = template_create(&inner, candidate("ops")).await;
        assert!(result.ok, "errors: {:?}", result.errors);
        let state = inner.state.load().unwrap();
        assert_eq!(state.active_template_id.as_deref(), Some("ops"));
    }

    #[tokio::test]
    async fn template_create_rejects_duplicate_id() {
        let (_dir, inner) = new_inner();
        assert!(template_create(&inner, candidate("ops")).await.ok);
        let result = template_create(&inner, candidate("ops")).await;
        assert!(!result.ok);
        assert!(result.errors.iter().any(|e| e.contains("ops")));
    }

    #[tokio::test]
    async fn template_create_rejects_a_field_pointer_that_does_not_resolve() {
        let (_dir, inner) = new_inner();
        let mut template = candidate("ops");
        template["fields"] = json!([{
            "id": "missing",
            "pointer": "/does/not/exist",
            "type": "string",
            "prompt": "p",
        }]);
        let result = template_create(&inner, template).await;
        assert!(!result.ok);
    }

    #[tokio::test]
    async fn template_copy_then_delete_reassigns_active_to_remaining_template() {
        let (_dir, inner) = new_inner();
        assert!(template_create(&inner, candidate("alpha")).await.ok);
        let copy = template_copy(&inner, "alpha", "beta", None, true).await;
        assert!(copy.ok, "errors: {:?}", copy.errors);

        let state = inner.state.load().unwrap();
        assert_eq!(state.active_template_id.as_deref(), Some("beta"));

        let deleted = template_delete(&inner, "beta");
        assert!(deleted.ok);
        let state = inner.state.load().unwrap();
        assert_eq!(state.active_template_id.as_deref(), Some("alpha"));
    }

    #[tokio::test]
    async fn template_activate_never_mutates_run_bookkeeping() {
        let (_dir, inner) = new_inner();
        assert!(template_create(&inner, candidate("alpha")).await.ok);
        assert!(template_create(&inner, candidate("beta")).await.ok);

        let result = template_activate(&inner, "beta");
        assert!(result.ok);
        let state = inner.state.load().unwrap();
        assert_eq!(state.active_template_id.as_deref(), Some("beta"));
        assert!(state.template_runs.is_empty());
    }

    #[tokio::test]
    async fn template_activate_rejects_unknown_id() {
        let (_dir, inner) = new_inner();
        let result = template_activate(&inner, "ghost");
        assert!(!result.ok);
    }

    #[tokio::test]
    async fn template_activate_rejects_path_traversal_id_without_touching_store() {
        let (_dir, inner) = new_inner();
        let result = template_activate(&inner, "../../etc/passwd");
        assert!(!result.ok);
    }

    #[tokio::test]
    async fn template_delete_rejects_path_traversal_id_without_touching_store() {
        let (dir, inner) = new_inner();
        let escaped = dir.path().join("escaped.json");
        std::fs::write(&escaped, "{}").unwrap();

        let result = template_delete(&inner, "../escaped");
        assert!(!result.ok);
        assert!(escaped.exists());
    }

    #[test]
    fn template_get_rejects_path_traversal_id() {
        let (_dir, inner) = new_inner();
        assert!(template_get(&inner, "../../etc/passwd").is_err());
    }

    #[tokio::test]
    async fn display_profile_set_clamps_and_persists() {
        let (_dir, inner) = new_inner();
        let patch = DisplayProfilePatch {
            width_px: Some(10),
            ..Default::default()
        };
        let result = display_profile_set(&inner, patch);
        assert!(result.ok);
        assert_eq!(
            result.data.unwrap().width_px,
            plashboard_utils::display_profile::MIN_WIDTH_PX
        );

        let state = inner.state.load().unwrap();
        assert_eq!(
            state.display_profile.unwrap().width_px,
            plashboard_utils::display_profile::MIN_WIDTH_PX
        );
    }

    #[tokio::test]
    async fn status_reports_template_and_enabled_counts() {
        let (_dir, inner) = new_inner();
        assert!(template_create(&inner, candidate("alpha")).await.ok);
        let mut disabled = candidate("beta");
        disabled["enabled"] = json!(false);
        assert!(template_create(&inner, disabled).await.ok);

        let result = status(&inner).await;
        assert!(result.ok);
        let snapshot = result.data.unwrap();
        assert_eq!(snapshot.template_count, 2);
        assert_eq!(snapshot.enabled_count, 1);
        assert!(snapshot.in_flight.is_empty());
    }
}
