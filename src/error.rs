//! Skald error types

use crate::validate::ValidationReport;

/// Skald error types
#[derive(Debug, thiserror::Error)]
pub enum SkaldError {
    // Session lifecycle errors
    #[error("model backend is unavailable on this device")]
    ModelUnavailable,

    #[error("model backend is still loading")]
    ModelNotReady,

    #[error("session has not been initialized")]
    SessionNotInitialized,

    // Structured generation errors
    /// The generated value does not satisfy its schema's constraints.
    ///
    /// Carries the complete violation report; validation never
    /// short-circuits, so every failing field is listed.
    #[error("schema violation: {0}")]
    SchemaViolation(ValidationReport),

    /// A streamed fragment introduced structure the schema does not declare.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The generation stream ended before every schema field was produced.
    #[error("generation ended with incomplete value")]
    GenerationIncomplete,

    // Tool errors
    /// Tool-call arguments failed the tool's argument schema.
    ///
    /// The capability is never invoked when this is returned.
    #[error("invalid arguments for tool '{tool}': {report}")]
    ToolArgumentInvalid {
        tool: String,
        report: ValidationReport,
    },

    #[error("tool '{tool}' failed: {reason}")]
    ToolExecutionFailed { tool: String, reason: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Opaque backend failures
    #[error("backend error: {0}")]
    Backend(String),
}

impl SkaldError {
    /// Whether the caller may retry the operation after remediation.
    ///
    /// Session-lifecycle errors are terminal for the attempted operation
    /// but not fatal to the process: the model may finish loading, or the
    /// user may enable the capability.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SkaldError::ModelUnavailable | SkaldError::ModelNotReady
        )
    }
}

/// Result type alias for Skald operations
pub type Result<T> = std::result::Result<T, SkaldError>;
