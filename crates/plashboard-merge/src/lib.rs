//! Schema validators and the merge engine.

pub mod fill_response;
pub mod merge;
pub mod schema;

pub use fill_response::{parse_fill_response, FillResponse};
pub use merge::{collect_current_values, merge as merge_values, validate_field_pointers};
pub use schema::{validate_fill_response_shape, validate_template_shape};
