//! Error taxonomy for a generation request.
//!
//! Every variant is fatal for the request that raised it; no stage downgrades
//! or swallows an error.

use llm::LlmError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Number of characters of raw model output kept in `MalformedOutput`.
pub const EXCERPT_CHARS: usize = 1000;

/// Errors raised while turning a specification into a bundle.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Requested vendor is not in the profile table
    #[error("Unsupported vendor: {0}")]
    UnsupportedVendor(String),

    /// Model text could not be coerced into a JSON object
    #[error("Failed to parse JSON from model output:\n{excerpt}")]
    MalformedOutput { excerpt: String },

    /// Plan is missing required structure
    #[error("Plan integrity error: {0}")]
    PlanIntegrity(String),

    /// Critic budget exhausted or generated content rejected by the lint
    #[error("Code generation error: {0}")]
    CodeGen(String),

    /// Caller supplied unusable input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport or provider failure, propagated unchanged
    #[error(transparent)]
    Model(#[from] LlmError),

    /// Filesystem failure while packaging
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Build a `MalformedOutput` carrying the head of the raw text.
    pub fn malformed_output(raw: &str) -> Self {
        PipelineError::MalformedOutput {
            excerpt: raw.chars().take(EXCERPT_CHARS).collect(),
        }
    }

    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedVendor(_) => "unsupported_vendor",
            PipelineError::MalformedOutput { .. } => "malformed_output",
            PipelineError::PlanIntegrity(_) => "plan_integrity",
            PipelineError::CodeGen(_) => "codegen",
            PipelineError::InvalidRequest(_) => "invalid_request",
            PipelineError::Model(_) => "model",
            PipelineError::Io(_) => "io",
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedVendor(_) | PipelineError::InvalidRequest(_)
        )
    }
}
