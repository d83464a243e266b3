//! Auto-seed a starter template from a pre-existing live dashboard file
//! when the template store is empty and auto-seeding is enabled.

use chrono::Utc;
use plashboard_store::{RunParams, Schedule, ScheduleMode, Template};
use plashboard_utils::atomic::read_json_opt;
use plashboard_utils::PlashboardError;
use serde_json::Value;

use crate::inner::Inner;

pub const STARTER_TEMPLATE_ID: &str = "starter";

/// If the template store is empty, `auto_seed_template` is enabled, and a
/// readable live dashboard file already exists, seed a starter template
/// whose `base_dashboard` is that file's content and activate it. No-op in
/// every other case.
pub fn seed_if_needed(inner: &Inner) -> Result<(), PlashboardError> {
    if !inner.config.auto_seed_template {
        return Ok(());
    }
    if !inner.templates.list()?.is_empty() {
        return Ok(());
    }
    let Some(base_dashboard) =
        read_json_opt::<Value>(&inner.config.dashboard_output_path)?
    else {
        return Ok(());
    };
    if !base_dashboard.is_object() {
        return Ok(());
    }

    let now = Utc::now().to_rfc3339();
    let template = Template {
        id: STARTER_TEMPLATE_ID.to_string(),
        name: "Starter".to_string(),
        enabled: true,
        schedule: Schedule {
            mode: ScheduleMode::Interval,
            every_minutes: 30,
            timezone: "UTC".to_string(),
        },
        base_dashboard,
        fields: Vec::new(),
        context: None,
        run: Some(RunParams::default()),
        description: Some(
            "Auto-seeded from the pre-existing live dashboard file.".to_string(),
        ),
        created_at: now.clone(),
        updated_at: now,
    };
    inner.templates.upsert(&template)?;

    let mut state = inner.state.load()?;
    if state.active_template_id.is_none() {
        state.active_template_id = Some(STARTER_TEMPLATE_ID.to_string());
    }
    inner.state.save(&state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inner::Inner;
    use plashboard_config::Config;
    use plashboard_fill::construct_backend_for_provider;
    use plashboard_publish::Publisher;
    use plashboard_store::{RunStore, StateStore, TemplateStore};
    use plashboard_utils::paths::DataLayout;
    use camino::Utf8PathBuf;
    use serde_json::json;

    fn inner_with_data_dir(data_dir: Utf8PathBuf) -> Inner {
        let mut config = Config {
            data_dir: data_dir.clone(),
            dashboard_output_path: data_dir.join("dashboard.json"),
            ..Config::default()
        };
        config.fill_provider = plashboard_config::FillProvider::Mock;
        let layout = DataLayout::new(data_dir);
        let templates = TemplateStore::new(layout.clone());
        let state = StateStore::new(layout.clone());
        let runs = RunStore::new(layout);
        let fill_backend = construct_backend_for_provider(&config);
        let publisher = Publisher::from_config(&config);
        Inner::new(config, templates, state, runs, fill_backend, publisher)
    }

    #[test]
    fn seeds_a_starter_template_from_an_existing_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(
            data_dir.join("dashboard.json").as_std_path(),
            serde_json::to_string(&json!({"title": "existing"})).unwrap(),
        )
        .unwrap();

        let inner = inner_with_data_dir(data_dir);
        seed_if_needed(&inner).unwrap();

        let templates = inner.templates.list().unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, STARTER_TEMPLATE_ID);

        let state = inner.state.load().unwrap();
        assert_eq!(state.active_template_id.as_deref(), Some(STARTER_TEMPLATE_ID));
    }

    #[test]
    fn no_op_when_no_live_dashboard_exists() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let inner = inner_with_data_dir(data_dir);
        seed_if_needed(&inner).unwrap();
        assert!(inner.templates.list().unwrap().is_empty());
    }

    #[test]
    fn no_op_when_templates_already_exist() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(
            data_dir.join("dashboard.json").as_std_path(),
            serde_json::to_string(&json!({"title": "existing"})).unwrap(),
        )
        .unwrap();
        let inner = inner_with_data_dir(data_dir);

        let existing = Template {
            id: "ops".to_string(),
            name: "Ops".to_string(),
            enabled: true,
            schedule: Schedule {
                mode: ScheduleMode::Interval,
                every_minutes: 30,
                timezone: "UTC".to_string(),
            },
            base_dashboard: json!({}),
            fields: Vec::new(),
            context: None,
            run: None,
            description: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        inner.templates.upsert(&existing).unwrap();

        seed_if_needed(&inner).unwrap();
        let templates = inner.templates.list().unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, "ops");
    }
}
