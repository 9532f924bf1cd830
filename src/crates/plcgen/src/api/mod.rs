//! HTTP delivery layer
//!
//! - `POST /generate_code` runs the pipeline for one request
//! - `GET /health` reports liveness

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use response::SuccessResponse;
pub use routes::{create_router, AppState};
