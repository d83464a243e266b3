//! The mock fill provider: synchronous, never fails, echoes
//! type-compatible current values and falls back to a type default
//! placeholder otherwise.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use plashboard_merge::FillResponse;
use plashboard_store::FieldType;
use plashboard_utils::PlashboardError;
use serde_json::{json, Value};

use crate::backend::FillBackend;
use crate::context::FillContext;

pub struct MockBackend;

#[async_trait]
impl FillBackend for MockBackend {
    async fn fill(&self, ctx: &FillContext) -> Result<FillResponse, PlashboardError> {
        let mut values = HashMap::with_capacity(ctx.template.fields.len());
        for field in &ctx.template.fields {
            let value = match ctx.current_values.get(&field.id) {
                Some(current) if type_matches(field.field_type, current) => current.clone(),
                _ => type_default(field.field_type),
            };
            values.insert(field.id.clone(), value);
        }
        Ok(FillResponse { values })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn type_matches(field_type: FieldType, value: &Value) -> bool {
    match field_type {
        FieldType::String => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Array => value.is_array(),
    }
}

fn type_default(field_type: FieldType) -> Value {
    match field_type {
        FieldType::String => json!(format!("plashboard-mock-{}", Utc::now().to_rfc3339())),
        FieldType::Number => json!(0),
        FieldType::Boolean => json!(false),
        FieldType::Array => json!([]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plashboard_store::{Constraints, FieldSpec, Schedule, ScheduleMode, Template};

    fn template_with_field(field_type: FieldType) -> Template {
        Template {
            id: "ops".to_string(),
            name: "Ops".to_string(),
            enabled: true,
            schedule: Schedule {
                mode: ScheduleMode::Interval,
                every_minutes: 30,
                timezone: "UTC".to_string(),
            },
            base_dashboard: json!({}),
            fields: vec![FieldSpec {
                id: "f".to_string(),
                pointer: "/f".to_string(),
                field_type,
                prompt: "p".to_string(),
                required: true,
                constraints: Constraints::default(),
            }],
            context: None,
            run: None,
            description: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn echoes_a_type_compatible_current_value() {
        let mut current_values = HashMap::new();
        current_values.insert("f".to_string(), json!("hello"));
        let ctx = FillContext {
            template: template_with_field(FieldType::String),
            current_values,
            attempt: 0,
            error_hint: None,
        };
        let response = MockBackend.fill(&ctx).await.unwrap();
        assert_eq!(response.values.get("f"), Some(&json!("hello")));
    }

    #[tokio::test]
    async fn falls_back_to_type_default_when_current_value_mismatches() {
        let mut current_values = HashMap::new();
        current_values.insert("f".to_string(), json!("not a number"));
        let ctx = FillContext {
            template: template_with_field(FieldType::Number),
            current_values,
            attempt: 0,
            error_hint: None,
        };
        let response = MockBackend.fill(&ctx).await.unwrap();
        assert_eq!(response.values.get("f"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn never_fails() {
        let ctx = FillContext {
            template: template_with_field(FieldType::Array),
            current_values: HashMap::new(),
            attempt: 5,
            error_hint: Some("previous failure".to_string()),
        };
        assert!(MockBackend.fill(&ctx).await.is_ok());
    }
}
