//! Runtime state store: the single `<data_dir>/state.json`.

use plashboard_utils::atomic::{atomic_write_json, read_json_opt};
use plashboard_utils::paths::DataLayout;
use plashboard_utils::PlashboardError;

use crate::model::RuntimeState;

/// Loads and persists the one `RuntimeState` document per data directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    layout: DataLayout,
}

impl StateStore {
    #[must_use]
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// The empty state when the file is absent, otherwise the
    /// parsed document. Missing keys in an older document deserialize to
    /// their `#[serde(default)]` values, which is how an older state
    /// document gets its missing keys normalized on load.
    pub fn load(&self) -> Result<RuntimeState, PlashboardError> {
        let state = read_json_opt::<RuntimeState>(&self.layout.state_path())?;
        Ok(state.unwrap_or_default())
    }

    /// Persist the state document atomically.
    pub fn save(&self, state: &RuntimeState) -> Result<(), PlashboardError> {
        atomic_write_json(&self.layout.state_path(), state)
    }
}
