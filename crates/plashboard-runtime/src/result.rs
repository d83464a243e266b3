//! The uniform API envelope: every runtime-API operation
//! returns `{ok, errors, data}` — one result shape for every check.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResult<T> {
    pub ok: bool,
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResult<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            data: Some(data),
        }
    }

    #[must_use]
    pub fn err(errors: Vec<String>) -> Self {
        Self {
            ok: false,
            errors,
            data: None,
        }
    }

    #[must_use]
    pub fn err_one(error: impl Into<String>) -> Self {
        Self::err(vec![error.into()])
    }
}
