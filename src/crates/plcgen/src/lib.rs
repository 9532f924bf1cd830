//! # plcgen
//!
//! Prompt-chaining pipeline that turns a natural-language PLC specification
//! into a vendor-specific project on disk.
//!
//! A request flows through five stages driven by the [`Orchestrator`]:
//!
//! 1. **Contract**: specification text to a structured JSON contract
//! 2. **Plan**: contract to an ordered manifest of files
//! 3. **Code**: one model call per planned file
//! 4. **Critic/Patch**: bounded review rounds applying full-file patches
//! 5. **Package**: README plus every file written under the output directory
//!
//! Vendor dialect and prompts come from a static [`VendorProfile`], chosen
//! explicitly or detected from the specification text.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use llm::remote::OpenAiClient;
//! use llm::RemoteLlmConfig;
//! use plcgen::{GenerationRequest, ModelGateway, Orchestrator, PipelineSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiClient::new(RemoteLlmConfig::new(
//!     std::env::var("OPENAI_API_KEY")?,
//!     "https://api.openai.com/v1",
//!     "gpt-4o-mini",
//! ))?;
//! let orchestrator = Orchestrator::new(
//!     ModelGateway::new(Arc::new(client)),
//!     PipelineSettings::default(),
//! );
//!
//! let result = orchestrator
//!     .generate(GenerationRequest::new("Two conveyors on an S7-1500 with jam detection"))
//!     .await?;
//! println!("{} files in {}", result.files.len(), result.bundle.project_dir.display());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod coerce;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lint;
pub mod package;
pub mod pipeline;
pub mod schema;
pub mod telemetry;
pub mod vendor;

pub use coerce::{coerce_json, JsonObject};
pub use config::{AppConfig, ConfigError, ConfigLoader};
pub use error::{PipelineError, Result};
pub use gateway::ModelGateway;
pub use lint::{LintOutcome, SkeletonLint};
pub use package::{write_bundle, Bundle};
pub use pipeline::{
    GenerationRequest, GenerationResult, Orchestrator, PipelineSettings,
    DEFAULT_MAX_CRITIC_ROUNDS,
};
pub use schema::{Contract, CriticReview, FileSet, Patch, Plan, PlanModule};
pub use vendor::{detect_vendor, render_template, select_profile, Vendor, VendorProfile};
