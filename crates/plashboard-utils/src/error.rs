//! The error taxonomy, as a single `thiserror` enum.
//!
//! Every pipeline run captures these into its artifact's `errors` list
//! instead of propagating a panic; only user-initiated API operations
//! (template CRUD, status, activate) surface them directly to the caller.

use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Groups taxonomy rows for log fields and metrics; not exposed over the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Template,
    FillProvider,
    Merge,
    Publish,
    Io,
}

#[derive(Debug, Error)]
pub enum PlashboardError {
    #[error("configuration invalid: {reason}")]
    ConfigInvalid { reason: String },

    #[error("template invalid: {reason}")]
    TemplateInvalid { reason: String },

    #[error("template not found: {id}")]
    TemplateNotFound { id: String },

    #[error("template already exists: {id}")]
    TemplateConflict { id: String },

    #[error("fill provider '{provider}' failed: {reason}")]
    FillProviderError { provider: String, reason: String },

    #[error("fill provider '{provider}' produced unparseable output: {reason}")]
    FillParseError { provider: String, reason: String },

    #[error("fill response shape invalid: {reason}")]
    FillShapeInvalid { reason: String },

    #[error("field '{field_id}' is required but missing")]
    MissingRequired { field_id: String },

    #[error("field '{field_id}' has type {expected}, got {actual}")]
    TypeMismatch {
        field_id: String,
        expected: String,
        actual: String,
    },

    #[error("field '{field_id}' violates constraint: {reason}")]
    ConstraintViolation { field_id: String, reason: String },

    #[error("fill response names unknown field id '{field_id}'")]
    UnknownFieldId { field_id: String },

    #[error("pointer '{pointer}' not found in document")]
    PointerNotFound { pointer: String },

    #[error("pointer '{pointer}' is invalid: {reason}")]
    PointerInvalid { pointer: String, reason: String },

    #[error("layout budget exceeded: {reason}")]
    LayoutBudgetExceeded { reason: String },

    #[error("writer rejected schema: {reason}")]
    SchemaInvalid { reason: String },

    #[error("run already in progress for template '{id}'")]
    RunInProgress { id: String },

    #[error("I/O error at {path}: {reason}")]
    Io { path: String, reason: String },
}

impl PlashboardError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigInvalid { .. } => ErrorCategory::Config,
            Self::TemplateInvalid { .. }
            | Self::TemplateNotFound { .. }
            | Self::TemplateConflict { .. } => ErrorCategory::Template,
            Self::FillProviderError { .. }
            | Self::FillParseError { .. }
            | Self::FillShapeInvalid { .. }
            | Self::RunInProgress { .. } => ErrorCategory::FillProvider,
            Self::MissingRequired { .. }
            | Self::TypeMismatch { .. }
            | Self::ConstraintViolation { .. }
            | Self::UnknownFieldId { .. }
            | Self::PointerNotFound { .. }
            | Self::PointerInvalid { .. } => ErrorCategory::Merge,
            Self::LayoutBudgetExceeded { .. } | Self::SchemaInvalid { .. } => {
                ErrorCategory::Publish
            }
            Self::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Map to a CLI exit code for one-shot (non-scheduler) operations.
    #[must_use]
    pub const fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::ConfigInvalid { .. } => ExitCode::ConfigError,
            Self::TemplateInvalid { .. }
            | Self::TemplateNotFound { .. }
            | Self::TemplateConflict { .. } => ExitCode::TemplateError,
            Self::RunInProgress { .. } => ExitCode::RunInProgress,
            Self::Io { .. } => ExitCode::IoError,
            _ => ExitCode::RunFailed,
        }
    }
}
