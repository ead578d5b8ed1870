//! Engine error types.

use thiserror::Error;

use amux_models::{RenderStage, ValidationError};

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller supplied malformed input; never retried internally
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not legal in the job's current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Render attempt failed; the job is back in `finalized` and may be retried
    #[error("Render failed for job {job_id} during {stage}: {message}")]
    RenderFailed {
        job_id: String,
        stage: RenderStage,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn render_failed(
        job_id: impl Into<String>,
        stage: RenderStage,
        message: impl Into<String>,
    ) -> Self {
        Self::RenderFailed {
            job_id: job_id.into(),
            stage,
            message: message.into(),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidArgument(_) => "invalid_argument",
            EngineError::NotFound(_) => "not_found",
            EngineError::Conflict(_) => "conflict",
            EngineError::RenderFailed { .. } => "render_failed",
            EngineError::Internal(_) => "internal",
        }
    }

    /// Whether calling the same operation again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::RenderFailed { .. } | EngineError::Internal(_))
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
