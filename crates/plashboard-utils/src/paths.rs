//! Data-directory layout: paths for state, templates, runs, and
//! the rendered snapshot, all rooted under one `data_dir`.

use camino::{Utf8Path, Utf8PathBuf};

/// Resolves the on-disk layout of a data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: Utf8PathBuf,
}

impl DataLayout {
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    #[must_use]
    pub fn state_path(&self) -> Utf8PathBuf {
        self.root.join("state.json")
    }

    #[must_use]
    pub fn templates_dir(&self) -> Utf8PathBuf {
        self.root.join("templates")
    }

    #[must_use]
    pub fn template_path(&self, id: &str) -> Utf8PathBuf {
        self.templates_dir().join(format!("{id}.json"))
    }

    #[must_use]
    pub fn runs_dir(&self, template_id: &str) -> Utf8PathBuf {
        self.root.join("runs").join(template_id)
    }

    #[must_use]
    pub fn run_artifact_path(&self, template_id: &str, started_at_filename: &str) -> Utf8PathBuf {
        self.runs_dir(template_id)
            .join(format!("{started_at_filename}.json"))
    }

    #[must_use]
    pub fn rendered_dir(&self, template_id: &str) -> Utf8PathBuf {
        self.root.join("rendered").join(template_id)
    }

    #[must_use]
    pub fn rendered_latest_path(&self, template_id: &str) -> Utf8PathBuf {
        self.rendered_dir(template_id).join("latest.json")
    }
}

/// Replace `:` with `-` so an ISO-8601 timestamp is a safe filename stem.
#[must_use]
pub fn filesystem_safe_timestamp(rfc3339: &str) -> String {
    rfc3339.replace(':', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_rooted_under_data_dir() {
        let layout = DataLayout::new("/var/lib/plashboard");
        assert_eq!(
            layout.state_path().as_str(),
            "/var/lib/plashboard/state.json"
        );
        assert_eq!(
            layout.template_path("ops").as_str(),
            "/var/lib/plashboard/templates/ops.json"
        );
        assert_eq!(
            layout.rendered_latest_path("ops").as_str(),
            "/var/lib/plashboard/rendered/ops/latest.json"
        );
    }

    #[test]
    fn timestamps_become_filesystem_safe() {
        assert_eq!(
            filesystem_safe_timestamp("2026-07-27T10:00:00Z"),
            "2026-07-27T10-00-00Z"
        );
    }
}
