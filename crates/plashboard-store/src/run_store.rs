//! Run artifact store: append-only records under
//! `<data_dir>/runs/<template_id>/<timestamp>.json`.

use plashboard_utils::atomic::{atomic_write_json, read_json_opt, sorted_dir_entries};
use plashboard_utils::paths::{filesystem_safe_timestamp, DataLayout};
use plashboard_utils::PlashboardError;

use crate::model::RunArtifact;

/// Writes and reads run artifacts. Artifacts are immutable once written —
/// this store only ever appends.
#[derive(Debug, Clone)]
pub struct RunStore {
    layout: DataLayout,
}

impl RunStore {
    #[must_use]
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Write one artifact, named by its (filesystem-safe) start timestamp.
    pub fn write(&self, artifact: &RunArtifact) -> Result<(), PlashboardError> {
        let filename = filesystem_safe_timestamp(&artifact.started_at);
        let path = self
            .layout
            .run_artifact_path(&artifact.template_id, &filename);
        atomic_write_json(&path, artifact)
    }

    /// The `n` most recent artifacts for a template, most recent first.
    /// ISO-8601 timestamps with colons replaced by hyphens still sort
    /// lexicographically in time order, so a descending filename sort is a
    /// descending time sort.
    pub fn latest(&self, template_id: &str, n: usize) -> Result<Vec<RunArtifact>, PlashboardError> {
        let dir = self.layout.runs_dir(template_id);
        let mut paths = sorted_dir_entries(&dir)?;
        paths.retain(|p| p.extension() == Some("json"));
        paths.reverse();
        paths.truncate(n);

        let mut artifacts = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(artifact) = read_json_opt::<RunArtifact>(&path)? {
                artifacts.push(artifact);
            }
        }
        Ok(artifacts)
    }
}
