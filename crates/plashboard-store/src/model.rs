//! The data model: `Template`, `RuntimeState`, and `RunArtifact`,
//! plus a few extra bookkeeping fields beyond the minimal shape.

use std::collections::HashMap;

use plashboard_utils::DisplayProfile;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A field's declared scalar/array type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
}

/// Optional per-field constraints. All are independently optional;
/// a field may carry any subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

fn default_true() -> bool {
    true
}

/// One entry of a template's field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    pub pointer: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub prompt: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub constraints: Constraints,
}

/// The only schedule mode currently supported; kept as an enum so future
/// modes extend cleanly instead of widening a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    Interval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub mode: ScheduleMode,
    pub every_minutes: u32,
    pub timezone: String,
}

/// Per-template overrides of the process-wide retry/repair defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_attempts: Option<u32>,
}

/// A dashboard template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub schedule: Schedule,
    pub base_dashboard: Value,
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunParams>,
    /// Operator-facing, pipeline-ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// `success | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

/// `schedule | manual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Schedule,
    Manual,
}

/// Per-template run bookkeeping held inside `RuntimeState`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<RunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// The single runtime-state document: one per data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeState {
    pub version: u32,
    #[serde(default)]
    pub active_template_id: Option<String>,
    #[serde(default)]
    pub template_runs: HashMap<String, RunState>,
    #[serde(default)]
    pub display_profile: Option<DisplayProfile>,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            version: 1,
            active_template_id: None,
            template_runs: HashMap::new(),
            display_profile: None,
        }
    }
}

/// Schema version stamped on every `RunArtifact`.
pub const RUN_ARTIFACT_SCHEMA_VERSION: &str = "1";

/// A single run's append-only record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifact {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub template_id: String,
    pub trigger: Trigger,
    pub status: RunStatus,
    pub started_at: String,
    pub ended_at: String,
    pub duration_ms: u64,
    pub attempt_count: u32,
    pub published: bool,
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_response: Option<Value>,
}

fn default_schema_version() -> String {
    RUN_ARTIFACT_SCHEMA_VERSION.to_string()
}
