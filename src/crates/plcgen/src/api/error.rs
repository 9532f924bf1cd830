//! API error types and HTTP response conversion
//!
//! Pipeline failures map to a status code, a stable error code and the
//! `{status: "error", ...}` envelope.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PipelineError;

/// Error body returned on every failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Always "error"
    pub status: String,
    /// Error kind
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Stable code for programmatic handling
    pub code: String,
}

impl ApiErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: error.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body could not be decoded
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "INVALID_REQUEST",
            ApiError::Pipeline(err) => match err {
                PipelineError::InvalidRequest(_) => "INVALID_REQUEST",
                PipelineError::UnsupportedVendor(_) => "UNSUPPORTED_VENDOR",
                PipelineError::MalformedOutput { .. } => "MALFORMED_OUTPUT",
                PipelineError::PlanIntegrity(_) => "PLAN_INTEGRITY",
                PipelineError::CodeGen(_) => "CODEGEN_FAILED",
                PipelineError::Model(_) => "MODEL_ERROR",
                PipelineError::Io(_) => "IO_ERROR",
            },
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "InvalidRequest",
            ApiError::Pipeline(err) => match err {
                PipelineError::InvalidRequest(_) => "InvalidRequest",
                PipelineError::UnsupportedVendor(_) => "UnsupportedVendor",
                PipelineError::MalformedOutput { .. } => "MalformedOutput",
                PipelineError::PlanIntegrity(_) => "PlanIntegrityError",
                PipelineError::CodeGen(_) => "CodeGenError",
                PipelineError::Model(_) => "ModelError",
                PipelineError::Io(_) => "IoError",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiErrorResponse::new(self.error_type(), self.to_string(), self.code());

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code = %body.code, "API error: {}", body.message);
        } else {
            tracing::warn!(status = status.as_u16(), code = %body.code, "API error: {}", body.message);
        }

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
