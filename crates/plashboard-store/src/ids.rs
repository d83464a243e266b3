//! Template id validation.

use once_cell::sync::Lazy;
use plashboard_utils::PlashboardError;
use regex::Regex;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").expect("valid regex"));

/// Validate a candidate template id against the id grammar.
pub fn validate_id(id: &str) -> Result<(), PlashboardError> {
    if ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        Err(PlashboardError::TemplateInvalid {
            reason: format!(
                "template id '{id}' must match ^[a-z0-9][a-z0-9_-]{{0,63}}$"
            ),
        })
    }
}
