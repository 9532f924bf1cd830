//! API response helpers

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// Success envelope: `{status: "success", data, message}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub status: String,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            data,
            message: message.into(),
        }
    }
}

/// 200 OK with the success envelope
pub fn ok<T: Serialize>(data: T, message: impl Into<String>) -> impl IntoResponse {
    (StatusCode::OK, Json(SuccessResponse::new(data, message)))
}
