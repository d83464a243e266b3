//! The parsed fill response type: `{"values": {field_id: scalar
//! | array}}`.

use std::collections::HashMap;

use plashboard_utils::PlashboardError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::validate_fill_response_shape;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillResponse {
    pub values: HashMap<String, Value>,
}

/// Validate shape, then parse. A shape failure (not `{values: {...}}`)
/// surfaces as `FillShapeInvalid`, distinct from a provider's stdout being
/// unparseable JSON at all (`FillParseError`, raised earlier by the
/// provider's own output extraction).
pub fn parse_fill_response(value: &Value, provider: &str) -> Result<FillResponse, PlashboardError> {
    let errors = validate_fill_response_shape(value);
    if !errors.is_empty() {
        return Err(PlashboardError::FillShapeInvalid {
            reason: format!("{provider}: {}", errors.join("; ")),
        });
    }

    serde_json::from_value(value.clone()).map_err(|e| PlashboardError::FillShapeInvalid {
        reason: format!("{provider}: {e}"),
    })
}
