//! Health check endpoint handler

use axum::{http::StatusCode, Json};

use crate::api::models::HealthResponse;

/// Handler for GET /health
///
/// Static liveness indicator; no dependency is probed.
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse::healthy()))
}
