//! The merge engine: field-pointer validation, current-value
//! collection, and merging a fill response into a template's base document.

use std::collections::{HashMap, HashSet};

use plashboard_pointer::{Pointer, PointerError};
use plashboard_store::{FieldSpec, FieldType, Template};
use plashboard_utils::PlashboardError;
use serde_json::Value;

/// Check that every field id and pointer is unique and that every pointer
/// resolves inside `template.base_dashboard`.
pub fn validate_field_pointers(template: &Template) -> Result<(), PlashboardError> {
    let mut seen_ids = HashSet::new();
    let mut seen_pointers = HashSet::new();

    for field in &template.fields {
        if !seen_ids.insert(field.id.as_str()) {
            return Err(PlashboardError::TemplateInvalid {
                reason: format!("duplicate field id '{}'", field.id),
            });
        }
        if !seen_pointers.insert(field.pointer.as_str()) {
            return Err(PlashboardError::TemplateInvalid {
                reason: format!("duplicate field pointer '{}'", field.pointer),
            });
        }

        let pointer = Pointer::parse(&field.pointer).map_err(|e| PlashboardError::TemplateInvalid {
            reason: format!("field '{}' has an invalid pointer: {e}", field.id),
        })?;
        if plashboard_pointer::try_read(&template.base_dashboard, &pointer).is_none() {
            return Err(PlashboardError::TemplateInvalid {
                reason: format!(
                    "field '{}': pointer path not found: '{}' does not resolve in base_dashboard",
                    field.id, field.pointer
                ),
            });
        }
    }

    Ok(())
}

/// The current value at each field's pointer, keyed by field id. Used as
/// `current_value` hints passed to the fill runner.
/// Assumes `validate_field_pointers` has already passed for this template.
pub fn collect_current_values(template: &Template) -> Result<HashMap<String, Value>, PlashboardError> {
    let mut values = HashMap::with_capacity(template.fields.len());
    for field in &template.fields {
        let pointer = Pointer::parse(&field.pointer).map_err(|e| PlashboardError::TemplateInvalid {
            reason: format!("field '{}' has an invalid pointer: {e}", field.id),
        })?;
        let current = plashboard_pointer::read(&template.base_dashboard, &pointer)
            .map_err(|e| PlashboardError::TemplateInvalid {
                reason: format!("field '{}' pointer failed to resolve: {e}", field.id),
            })?
            .clone();
        values.insert(field.id.clone(), current);
    }
    Ok(values)
}

/// Deep-clone `template.base_dashboard` and write `values` into it at each
/// field's pointer after type/constraint checking. The base
/// document itself is never mutated.
pub fn merge(template: &Template, values: &HashMap<String, Value>) -> Result<Value, PlashboardError> {
    let known_ids: HashSet<&str> = template.fields.iter().map(|f| f.id.as_str()).collect();
    for key in values.keys() {
        if !known_ids.contains(key.as_str()) {
            return Err(PlashboardError::UnknownFieldId {
                field_id: key.clone(),
            });
        }
    }

    let mut merged = template.base_dashboard.clone();

    for field in &template.fields {
        let provided = values.get(&field.id).filter(|v| !v.is_null());
        let value = match provided {
            Some(v) => v.clone(),
            None => {
                if field.required {
                    return Err(PlashboardError::MissingRequired {
                        field_id: field.id.clone(),
                    });
                }
                continue;
            }
        };

        check_type_and_constraints(field, &value)?;

        let pointer = Pointer::parse(&field.pointer).map_err(|e| PlashboardError::TemplateInvalid {
            reason: format!("field '{}' has an invalid pointer: {e}", field.id),
        })?;
        plashboard_pointer::write(&mut merged, &pointer, value).map_err(pointer_write_error)?;
    }

    Ok(merged)
}

fn check_type_and_constraints(field: &FieldSpec, value: &Value) -> Result<(), PlashboardError> {
    let type_name = match field.field_type {
        FieldType::String => "string",
        FieldType::Number => "number",
        FieldType::Boolean => "boolean",
        FieldType::Array => "array",
    };

    match field.field_type {
        FieldType::String => {
            let Some(s) = value.as_str() else {
                return Err(type_mismatch(field, type_name, value));
            };
            if let Some(max_len) = field.constraints.max_len {
                if s.chars().count() > max_len {
                    return Err(PlashboardError::ConstraintViolation {
                        field_id: field.id.clone(),
                        reason: format!("exceeds max_len {max_len}"),
                    });
                }
            }
        }
        FieldType::Number => {
            let Some(n) = value.as_f64() else {
                return Err(type_mismatch(field, type_name, value));
            };
            if let Some(min) = field.constraints.min {
                if n < min {
                    return Err(PlashboardError::ConstraintViolation {
                        field_id: field.id.clone(),
                        reason: format!("{n} is below min {min}"),
                    });
                }
            }
            if let Some(max) = field.constraints.max {
                if n > max {
                    return Err(PlashboardError::ConstraintViolation {
                        field_id: field.id.clone(),
                        reason: format!("{n} is above max {max}"),
                    });
                }
            }
        }
        FieldType::Boolean => {
            if !value.is_boolean() {
                return Err(type_mismatch(field, type_name, value));
            }
        }
        FieldType::Array => {
            let Some(items) = value.as_array() else {
                return Err(type_mismatch(field, type_name, value));
            };
            if let Some(min_items) = field.constraints.min_items {
                if items.len() < min_items {
                    return Err(PlashboardError::ConstraintViolation {
                        field_id: field.id.clone(),
                        reason: format!("has {} items, fewer than min_items {min_items}", items.len()),
                    });
                }
            }
            if let Some(max_items) = field.constraints.max_items {
                if items.len() > max_items {
                    return Err(PlashboardError::ConstraintViolation {
                        field_id: field.id.clone(),
                        reason: format!("has {} items, more than max_items {max_items}", items.len()),
                    });
                }
            }
        }
    }

    if let Some(allowed) = &field.constraints.enum_values {
        if !allowed.contains(value) {
            return Err(PlashboardError::ConstraintViolation {
                field_id: field.id.clone(),
                reason: "value is not a member of the allowed enum".to_string(),
            });
        }
    }

    Ok(())
}

fn pointer_write_error(e: PointerError) -> PlashboardError {
    match e {
        PointerError::NotFound { pointer } => PlashboardError::PointerNotFound { pointer },
        PointerError::Invalid { pointer, reason } => PlashboardError::PointerInvalid { pointer, reason },
        PointerError::MalformedPointer(pointer) => PlashboardError::PointerInvalid {
            pointer,
            reason: "malformed pointer".to_string(),
        },
    }
}

fn type_mismatch(field: &FieldSpec, expected: &str, actual: &Value) -> PlashboardError {
    let actual_name = match actual {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    PlashboardError::TypeMismatch {
        field_id: field.id.clone(),
        expected: expected.to_string(),
        actual: actual_name.to_string(),
    }
}
