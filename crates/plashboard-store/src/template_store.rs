//! Template store: one JSON file per template under
//! `<data_dir>/templates/`.

use plashboard_utils::atomic::{atomic_write_json, read_json_opt, remove_file_if_exists, sorted_dir_entries};
use plashboard_utils::paths::DataLayout;
use plashboard_utils::PlashboardError;

use crate::model::Template;

/// Reads and writes `Template` documents. Stateless: every call hits the
/// filesystem, so concurrent readers (e.g. `status`) always see the latest
/// committed template set.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    layout: DataLayout,
}

impl TemplateStore {
    #[must_use]
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// All templates, sorted by id ascending — the order
    /// activation fallback and deletion reassignment rely on.
    pub fn list(&self) -> Result<Vec<Template>, PlashboardError> {
        let dir = self.layout.templates_dir();
        let mut templates = Vec::new();
        for path in sorted_dir_entries(&dir)? {
            if path.extension() != Some("json") {
                continue;
            }
            if let Some(template) = read_json_opt::<Template>(&path)? {
                templates.push(template);
            }
        }
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(templates)
    }

    /// A single template by id, or `None` if it doesn't exist.
    pub fn get(&self, id: &str) -> Result<Option<Template>, PlashboardError> {
        read_json_opt(&self.layout.template_path(id))
    }

    /// Write a template atomically, creating or overwriting its file.
    pub fn upsert(&self, template: &Template) -> Result<(), PlashboardError> {
        atomic_write_json(&self.layout.template_path(&template.id), template)
    }

    /// Delete a template's file. Missing is success.
    pub fn remove(&self, id: &str) -> Result<(), PlashboardError> {
        remove_file_if_exists(&self.layout.template_path(id))
    }
}
