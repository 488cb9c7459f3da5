//! Error handling for the Crop Health Hyperspectral Analysis service
//!
//! Every error response uses the analysis error envelope
//! (`{"status": "error", "stage", "code", "message"}`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::{AnalysisEnvelope, AnalysisError};
use thiserror::Error;

use crate::analysis::{AnalysisFailure, PipelineError};

/// Stage reported for failures outside the analysis pipeline
const REQUEST_STAGE: &str = "request";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Pipeline errors
    #[error(transparent)]
    Analysis(#[from] AnalysisFailure),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Analysis(failure) => match failure.error {
                ref e if e.is_client_error() => StatusCode::BAD_REQUEST,
                PipelineError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                PipelineError::PoolExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Validation { .. } | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Body of the error envelope
    pub fn to_error_envelope(&self) -> AnalysisError {
        let request_error = |code: &str, message: String| AnalysisError {
            stage: REQUEST_STAGE.to_string(),
            code: code.to_string(),
            message,
        };

        match self {
            AppError::Analysis(failure) => failure.to_error_envelope(),
            AppError::Validation { field, message } => {
                request_error("VALIDATION_ERROR", format!("{}: {}", field, message))
            }
            AppError::ValidationError(msg) => request_error("VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => request_error("PAYLOAD_TOO_LARGE", msg.clone()),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(error: PipelineError) -> Self {
        AppError::Analysis(AnalysisFailure::new(
            crate::analysis::AnalysisStage::Pending,
            error,
        ))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = AnalysisEnvelope::Error(self.to_error_envelope());

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
