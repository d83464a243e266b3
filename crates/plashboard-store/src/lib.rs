//! Template, runtime-state, and run-artifact stores. Every store
//! is a thin filesystem wrapper over `plashboard_utils::atomic` — the stores
//! hold no in-memory cache, so one-shot CLI commands and the scheduler's own
//! in-memory state cache always read what was last committed to disk.

pub mod ids;
pub mod model;
pub mod run_store;
pub mod state_store;
pub mod template_store;

pub use ids::validate_id;
pub use model::{
    Constraints, FieldSpec, FieldType, RunArtifact, RunParams, RunState, RunStatus, RuntimeState,
    Schedule, ScheduleMode, Template, Trigger, RUN_ARTIFACT_SCHEMA_VERSION,
};
pub use run_store::RunStore;
pub use state_store::StateStore;
pub use template_store::TemplateStore;
