//! Request and response bodies.

use serde::{Deserialize, Serialize};

use crate::package::Bundle;
use crate::pipeline::{GenerationRequest, GenerationResult};
use crate::schema::{Contract, FileSet, Plan};

/// Service name reported by the health probe.
pub const SERVICE_NAME: &str = "plc-code-generator";

/// Message attached to a successful generation.
pub const GENERATED_MESSAGE: &str = "Code generated successfully";

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `POST /generate_code` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCodeRequest {
    pub spec_text: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}

impl From<GenerateCodeRequest> for GenerationRequest {
    fn from(req: GenerateCodeRequest) -> Self {
        GenerationRequest {
            spec_text: req.spec_text,
            project_name: req.project_name,
            vendor: req.vendor,
        }
    }
}

/// `data` payload of a successful generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCodeData {
    pub contract: Contract,
    pub plan: Plan,
    pub files: FileSet,
    pub bundle: Bundle,
}

impl From<GenerationResult> for GenerateCodeData {
    fn from(result: GenerationResult) -> Self {
        Self {
            contract: result.contract,
            plan: result.plan,
            files: result.files,
            bundle: result.bundle,
        }
    }
}
