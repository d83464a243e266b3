//! Shared provider output parsing: stdout may be a bare JSON
//! object, the same fenced in triple backticks, or buried in a larger JSON
//! envelope. Recursion is capped at depth 10.

use serde_json::Value;

const MAX_DEPTH: usize = 10;

/// Extract a `{"values": {...}}`-shaped JSON value from raw provider
/// output, or `None` if nothing recognizable is found within the depth cap.
#[must_use]
pub fn extract_fill_value(raw: &str) -> Option<Value> {
    extract(raw.trim(), 0)
}

fn extract(input: &str, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(input) {
        if let Some(found) = recurse(value, depth + 1) {
            return Some(found);
        }
    }

    if input.starts_with("```") {
        let lines: Vec<&str> = input.lines().collect();
        if lines.len() >= 2 {
            let inner = lines[1..lines.len() - 1].join("\n");
            if let Some(found) = extract(inner.trim(), depth + 1) {
                return Some(found);
            }
        }
    }

    if let (Some(start), Some(end)) = (input.find('{'), input.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&input[start..=end]) {
                if let Some(found) = recurse(value, depth + 1) {
                    return Some(found);
                }
            }
        }
    }

    None
}

fn recurse(value: Value, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return None;
    }

    match value {
        Value::String(s) => extract(s.trim(), depth + 1),
        Value::Array(items) => items.into_iter().find_map(|item| recurse(item, depth + 1)),
        Value::Object(ref map) => {
            if map.get("values").is_some_and(Value::is_object) {
                Some(value)
            } else {
                map.clone()
                    .into_values()
                    .find_map(|item| recurse(item, depth + 1))
            }
        }
        _ => None,
    }
}
