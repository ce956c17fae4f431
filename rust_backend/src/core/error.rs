//! Error types for pipeline operations.
//!
//! Record-level variants (`InvalidCoordinate`, `InvalidDistance`,
//! `MissingRequiredField`) fail a single row and are collected into the run
//! report. `SourceUnavailable` triggers fallback substitution. Only
//! `StageFailure`, `Configuration` and I/O errors stop a run.

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type for pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid distance: {0}")]
    InvalidDistance(String),

    #[error("Missing required field '{field}' in {catalog} record")]
    MissingRequiredField { catalog: String, field: String },

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Stage {stage} failed: {reason}")]
    StageFailure { stage: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True for errors that only invalidate the offending record.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidCoordinate(_)
                | PipelineError::InvalidDistance(_)
                | PipelineError::MissingRequiredField { .. }
        )
    }

    pub fn missing_field(catalog: impl Into<String>, field: impl Into<String>) -> Self {
        PipelineError::MissingRequiredField {
            catalog: catalog.into(),
            field: field.into(),
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(e: polars::error::PolarsError) -> Self {
        PipelineError::Export(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Export(e.to_string())
    }
}
