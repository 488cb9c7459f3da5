//! Error taxonomy of the analysis pipeline

use thiserror::Error;

/// Errors raised by pipeline components
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Spectral cube contains no pixels")]
    EmptyCube,

    #[error("Insufficient data: vegetation index arrays are empty")]
    InsufficientData,

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Analysis exceeded its time limit")]
    Timeout,

    #[error("Worker pool exhausted: all {0} analysis slots are busy")]
    PoolExhausted(usize),

    #[error("Internal analysis error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidImage(_) => "INVALID_IMAGE",
            PipelineError::InvalidParameter(_) => "INVALID_PARAMETER",
            PipelineError::EmptyCube => "EMPTY_CUBE",
            PipelineError::InsufficientData => "INSUFFICIENT_DATA",
            PipelineError::UnknownLocation(_) => "UNKNOWN_LOCATION",
            PipelineError::Timeout => "TIMEOUT",
            PipelineError::PoolExhausted(_) => "POOL_EXHAUSTED",
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller's input caused the failure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidImage(_)
                | PipelineError::InvalidParameter(_)
                | PipelineError::UnknownLocation(_)
        )
    }
}

/// Result type alias for pipeline components
pub type PipelineResult<T> = Result<T, PipelineError>;
