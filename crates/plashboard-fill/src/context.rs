//! The fill runner's input and the deterministic prompt built from it.

use std::collections::HashMap;

use plashboard_store::{FieldSpec, FieldType, Template};
use serde_json::{json, Value};

/// Everything a fill backend needs for one attempt.
#[derive(Debug, Clone)]
pub struct FillContext {
    pub template: Template,
    pub current_values: HashMap<String, Value>,
    pub attempt: u32,
    pub error_hint: Option<String>,
}

/// Build the deterministic prompt object: `instructions`,
/// `template`, `fields`, `expected_response_schema`.
#[must_use]
pub fn build_prompt(ctx: &FillContext) -> Value {
    let fields: Vec<Value> = ctx
        .template
        .fields
        .iter()
        .map(|field| field_prompt_entry(field, &ctx.current_values))
        .collect();

    let mut instructions =
        "Return a JSON object with a single key \"values\" mapping each field id to a value \
         of the declared type."
            .to_string();
    if let Some(hint) = &ctx.error_hint {
        instructions.push_str(&format!(" The previous attempt failed: {hint}. Fix it."));
    }

    json!({
        "instructions": instructions,
        "template": {
            "id": ctx.template.id,
            "name": ctx.template.name,
            "context": ctx.template.context,
        },
        "fields": fields,
        "expected_response_schema": {
            "type": "object",
            "properties": {
                "values": {"type": "object"}
            },
            "required": ["values"],
        },
    })
}

fn field_prompt_entry(field: &FieldSpec, current_values: &HashMap<String, Value>) -> Value {
    let type_name = match field.field_type {
        FieldType::String => "string",
        FieldType::Number => "number",
        FieldType::Boolean => "boolean",
        FieldType::Array => "array",
    };

    json!({
        "id": field.id,
        "type": type_name,
        "prompt": field.prompt,
        "required": field.required,
        "constraints": field.constraints,
        "current_value": current_values.get(&field.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plashboard_store::{Constraints, Schedule, ScheduleMode};

    fn sample_template() -> Template {
        Template {
            id: "ops".to_string(),
            name: "Ops".to_string(),
            enabled: true,
            schedule: Schedule {
                mode: ScheduleMode::Interval,
                every_minutes: 30,
                timezone: "UTC".to_string(),
            },
            base_dashboard: json!({"title": "x"}),
            fields: vec![FieldSpec {
                id: "title".to_string(),
                pointer: "/title".to_string(),
                field_type: FieldType::String,
                prompt: "Title".to_string(),
                required: true,
                constraints: Constraints::default(),
            }],
            context: Some("weekly ops review".to_string()),
            run: None,
            description: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn prompt_includes_field_and_current_value() {
        let mut current_values = HashMap::new();
        current_values.insert("title".to_string(), json!("x"));
        let ctx = FillContext {
            template: sample_template(),
            current_values,
            attempt: 0,
            error_hint: None,
        };
        let prompt = build_prompt(&ctx);
        assert_eq!(prompt["fields"][0]["id"], json!("title"));
        assert_eq!(prompt["fields"][0]["current_value"], json!("x"));
    }

    #[test]
    fn prompt_mentions_error_hint_when_present() {
        let ctx = FillContext {
            template: sample_template(),
            current_values: HashMap::new(),
            attempt: 1,
            error_hint: Some("title too long".to_string()),
        };
        let prompt = build_prompt(&ctx);
        let instructions = prompt["instructions"].as_str().unwrap();
        assert!(instructions.contains("title too long"));
    }
}
