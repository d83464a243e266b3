//! Structural validators for the two JSON shapes this system accepts from
//! the outside: a template document and a fill response.
//!
//! These collect every error found rather than stopping at the first one:
//! callers (the API layer) surface the whole list to the caller at once
//! instead of round-tripping one fix at a time.

use serde_json::Value;

/// Validate the shape of a candidate template document. Does not check
/// field-pointer resolution or publishability — those are the merge
/// engine's and the publisher's jobs respectively.
#[must_use]
pub fn validate_template_shape(value: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(obj) = value.as_object() else {
        errors.push("template must be a JSON object".to_string());
        return errors;
    };

    require_string(obj, "id", &mut errors);
    require_string(obj, "name", &mut errors);
    require_bool(obj, "enabled", &mut errors);

    match obj.get("schedule").and_then(Value::as_object) {
        Some(schedule) => {
            match schedule.get("mode").and_then(Value::as_str) {
                Some("interval") => {}
                Some(_) => errors.push("schedule.mode must be \"interval\"".to_string()),
                None => errors.push("schedule.mode is required".to_string()),
            }
            match schedule.get("every_minutes").and_then(Value::as_u64) {
                Some(n) if n >= 1 => {}
                _ => errors.push("schedule.every_minutes must be an integer >= 1".to_string()),
            }
            require_string(schedule, "timezone", &mut errors);
        }
        None => errors.push("schedule must be an object".to_string()),
    }

    match obj.get("base_dashboard") {
        Some(Value::Object(_)) => {}
        _ => errors.push("base_dashboard must be a JSON object".to_string()),
    }

    match obj.get("fields").and_then(Value::as_array) {
        Some(fields) => {
            for (index, field) in fields.iter().enumerate() {
                validate_field_spec_shape(field, index, &mut errors);
            }
        }
        None => errors.push("fields must be an array".to_string()),
    }

    errors
}

fn validate_field_spec_shape(value: &Value, index: usize, errors: &mut Vec<String>) {
    let Some(obj) = value.as_object() else {
        errors.push(format!("fields[{index}] must be an object"));
        return;
    };

    require_string(obj, "id", errors);
    require_string(obj, "pointer", errors);
    require_string(obj, "prompt", errors);

    match obj.get("type").and_then(Value::as_str) {
        Some("string" | "number" | "boolean" | "array") => {}
        Some(other) => errors.push(format!(
            "fields[{index}].type '{other}' must be one of string, number, boolean, array"
        )),
        None => errors.push(format!("fields[{index}].type is required")),
    }

    if let Some(required) = obj.get("required") {
        if !required.is_boolean() {
            errors.push(format!("fields[{index}].required must be a boolean"));
        }
    }
}

fn require_string(obj: &serde_json::Map<String, Value>, key: &str, errors: &mut Vec<String>) {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => {}
        Some(Value::String(_)) => errors.push(format!("{key} must not be empty")),
        _ => errors.push(format!("{key} is required and must be a string")),
    }
}

fn require_bool(obj: &serde_json::Map<String, Value>, key: &str, errors: &mut Vec<String>) {
    match obj.get(key) {
        Some(Value::Bool(_)) => {}
        _ => errors.push(format!("{key} is required and must be a boolean")),
    }
}

/// Validate the shape of a fill response: a JSON object with a single
/// recognized key `values`, itself an object.
#[must_use]
pub fn validate_fill_response_shape(value: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(obj) = value.as_object() else {
        errors.push("fill response must be a JSON object".to_string());
        return errors;
    };

    match obj.get("values") {
        Some(Value::Object(_)) => {}
        Some(_) => errors.push("values must be a JSON object".to_string()),
        None => errors.push("values is required".to_string()),
    }

    errors
}
