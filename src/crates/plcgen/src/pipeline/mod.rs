//! Five-stage generation pipeline.
//!
//! Contract → Plan → Code → Critic/Patch → Package, strictly in order for
//! one request. Only the critic round repeats, and at most
//! `max_critic_rounds` times. Any stage error aborts the request.

mod stages;

use crate::config::{AppConfig, ConfigError, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::gateway::ModelGateway;
use crate::lint::SkeletonLint;
use crate::package::{validate_project_name, Bundle};
use crate::schema::{Contract, FileSet, Plan};
use crate::vendor::{select_profile, Vendor};
use anyhow::Context;
use llm::remote::OpenAiClient;
use llm::RemoteLlmConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Default bound on critic/patch rounds.
pub const DEFAULT_MAX_CRITIC_ROUNDS: u32 = 3;

/// Project name used when neither the request nor configuration provides one.
pub const DEFAULT_PROJECT_NAME: &str = "PandauraProject";

/// Runtime settings for the orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub out_dir: PathBuf,
    pub default_project_name: String,
    pub max_critic_rounds: u32,
    /// Enabled only when configured
    pub skeleton_lint: Option<SkeletonLint>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("output"),
            default_project_name: DEFAULT_PROJECT_NAME.to_string(),
            max_critic_rounds: DEFAULT_MAX_CRITIC_ROUNDS,
            skeleton_lint: None,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &PipelineConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            out_dir: config.out_dir.clone(),
            default_project_name: config.default_project_name.clone(),
            max_critic_rounds: config.max_critic_rounds,
            skeleton_lint: config.build_lint()?,
        })
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_max_critic_rounds(mut self, rounds: u32) -> Self {
        self.max_critic_rounds = rounds;
        self
    }

    pub fn with_skeleton_lint(mut self, lint: SkeletonLint) -> Self {
        self.skeleton_lint = Some(lint);
        self
    }
}

/// Input for one generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub spec_text: String,
    #[serde(default)]
    pub project_name: Option<String>,
    /// Explicit vendor; absent or blank triggers keyword detection
    #[serde(default)]
    pub vendor: Option<String>,
}

impl GenerationRequest {
    pub fn new(spec_text: impl Into<String>) -> Self {
        Self {
            spec_text: spec_text.into(),
            ..Self::default()
        }
    }

    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }
}

/// Everything a successful generation produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub contract: Contract,
    pub plan: Plan,
    pub files: FileSet,
    pub bundle: Bundle,
    #[serde(skip)]
    pub vendor: Vendor,
}

/// Drives the model gateway through the five stages.
#[derive(Clone)]
pub struct Orchestrator {
    gateway: ModelGateway,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(gateway: ModelGateway, settings: PipelineSettings) -> Self {
        Self { gateway, settings }
    }

    /// Wire an OpenAI-compatible client and the pipeline settings from
    /// configuration. Fails when no API key can be resolved.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let api_key = config.resolve_api_key()?;
        let mut llm_config =
            RemoteLlmConfig::new(api_key, &config.llm.base_url, &config.llm.model)
                .with_timeout(Duration::from_secs(config.llm.timeout_secs));
        if let Some(organization) = &config.llm.organization {
            llm_config = llm_config.with_organization(organization);
        }

        let client = OpenAiClient::new(llm_config).context("failed to build model client")?;
        let gateway =
            ModelGateway::new(Arc::new(client)).with_temperature(config.llm.temperature);
        let settings = PipelineSettings::from_config(&config.pipeline)?;

        Ok(Self::new(gateway, settings))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    /// Run the full pipeline for one request.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let request_id = Uuid::new_v4();
        let span = info_span!("generate", %request_id);

        async move {
            let started = Instant::now();
            let result = self.run(request).await;

            match &result {
                Ok(output) => info!(
                    vendor = %output.vendor,
                    files = output.files.len(),
                    project_dir = %output.bundle.project_dir.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Generation completed"
                ),
                Err(e) => warn!(
                    kind = e.kind(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Generation failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let GenerationRequest {
            spec_text,
            project_name,
            vendor,
        } = request;

        if spec_text.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "spec_text must not be empty".to_string(),
            ));
        }

        let project_name = self.resolve_project_name(project_name.as_deref())?;
        let profile = select_profile(vendor.as_deref(), &spec_text)?;

        info!(
            vendor = profile.name,
            lang = profile.lang,
            project = %project_name,
            explicit_vendor = vendor.is_some(),
            "Starting generation"
        );

        let contract = self.spec_to_contract(&spec_text).await?;
        let plan = self.contract_to_plan(profile, &contract, &project_name).await?;
        let files = self.plan_to_code(profile, &contract, &plan).await?;
        let files = self.critic_and_patch(profile, &contract, &plan, files).await?;
        let bundle = self.pack(profile, &plan, &files, &project_name).await?;

        Ok(GenerationResult {
            contract,
            plan,
            files,
            bundle,
            vendor: profile.vendor,
        })
    }

    fn resolve_project_name(&self, requested: Option<&str>) -> Result<String> {
        let name = requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.settings.default_project_name)
            .trim()
            .to_string();
        validate_project_name(&name)?;
        Ok(name)
    }
}
