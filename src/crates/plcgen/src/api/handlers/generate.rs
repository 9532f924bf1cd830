//! Code generation endpoint handler

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};

use crate::api::{
    error::ApiResult,
    models::{GenerateCodeData, GenerateCodeRequest, GENERATED_MESSAGE},
    response,
    routes::AppState,
};

/// Handler for POST /generate_code
///
/// Runs the whole pipeline for the request and returns the contract, plan,
/// files and bundle. Blocks until the last stage finishes.
pub async fn generate_code(
    State(state): State<AppState>,
    payload: Result<Json<GenerateCodeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let result = state.orchestrator.generate(request.into()).await?;
    Ok(response::ok(GenerateCodeData::from(result), GENERATED_MESSAGE))
}
