//! Individual pipeline stages.

use super::Orchestrator;
use crate::error::{PipelineError, Result};
use crate::package::{write_bundle, Bundle};
use crate::schema::{ensure_not_reserved, normalize_relpath, Contract, CriticReview, FileSet, Plan};
use crate::vendor::prompts::{CONTRACT_SYSTEM, CONTRACT_USER, CRITIC_RESPONSE_SHAPE};
use crate::vendor::{render_template, VendorProfile};
use llm::Message;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

fn pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| PipelineError::CodeGen(e.to_string()))
}

impl Orchestrator {
    /// Stage 1: extract the structured contract from the specification.
    pub async fn spec_to_contract(&self, spec_text: &str) -> Result<Contract> {
        let started = Instant::now();
        info!(stage = "contract", "Stage started");
        let messages = vec![
            Message::system(CONTRACT_SYSTEM),
            Message::user(render_template(CONTRACT_USER, &[("spec_text", spec_text)])),
        ];

        let contract = Contract::from_object(self.gateway.call_json(messages).await?)?;

        info!(
            stage = "contract",
            keys = contract.keys().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stage finished"
        );
        debug!(contract = %serde_json::Value::Object(contract.as_object().clone()), "Contract snapshot");
        Ok(contract)
    }

    /// Stage 2: turn the contract into a validated module manifest.
    pub async fn contract_to_plan(
        &self,
        profile: &VendorProfile,
        contract: &Contract,
        project_name: &str,
    ) -> Result<Plan> {
        let started = Instant::now();
        info!(stage = "plan", "Stage started");
        let contract_json = pretty(contract)?;
        let messages = vec![
            Message::system(profile.system_prompt),
            Message::user(render_template(
                profile.plan_prompt,
                &[("project_name", project_name), ("contract_json", &contract_json)],
            )),
        ];

        let plan = Plan::from_object(self.gateway.call_json(messages).await?)?;

        info!(
            stage = "plan",
            modules = plan.modules.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stage finished"
        );
        debug!(relpaths = ?plan.relpaths().collect::<Vec<_>>(), "Plan snapshot");
        Ok(plan)
    }

    /// Stage 3: generate every planned module, one model call each, in plan order.
    pub async fn plan_to_code(
        &self,
        profile: &VendorProfile,
        contract: &Contract,
        plan: &Plan,
    ) -> Result<FileSet> {
        let started = Instant::now();
        info!(stage = "code", modules = plan.modules.len(), "Stage started");
        let contract_json = pretty(contract)?;
        let mut files = FileSet::new();

        for module in &plan.modules {
            let module_json = pretty(module)?;
            let messages = vec![
                Message::system(profile.system_prompt),
                Message::user(render_template(
                    profile.module_prompt,
                    &[("module_json", &module_json), ("contract_json", &contract_json)],
                )),
            ];

            let code = self.gateway.call_text(messages).await?;

            if let Some(lint) = &self.settings.skeleton_lint {
                lint.enforce(&module.relpath, &code)?;
            }

            debug!(
                module = module.display_name(),
                relpath = %module.relpath,
                chars = code.len(),
                "Module generated"
            );
            files.insert(module.relpath.clone(), code);
        }

        info!(
            stage = "code",
            files = files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stage finished"
        );
        Ok(files)
    }

    /// Stage 4: review the files and apply full-file patches until the critic
    /// reports completion or the round budget runs out.
    pub async fn critic_and_patch(
        &self,
        profile: &VendorProfile,
        contract: &Contract,
        plan: &Plan,
        mut files: FileSet,
    ) -> Result<FileSet> {
        let max_rounds = self.settings.max_critic_rounds;
        if max_rounds == 0 {
            debug!(stage = "critic", "Critic disabled, keeping files unchanged");
            return Ok(files);
        }

        let started = Instant::now();
        info!(stage = "critic", max_rounds, "Stage started");
        let plan_json = pretty(plan)?;
        let contract_json = pretty(contract)?;

        for round in 1..=max_rounds {
            let files_json = pretty(&files)?;
            let messages = vec![
                Message::system(profile.system_prompt),
                Message::user(render_template(
                    profile.critic_prompt,
                    &[
                        ("checklist", profile.checklist),
                        ("critic_response_shape", CRITIC_RESPONSE_SHAPE),
                        ("plan_json", &plan_json),
                        ("files_json", &files_json),
                        ("contract_json", &contract_json),
                    ],
                )),
            ];

            let review = CriticReview::from_object(self.gateway.call_json(messages).await?)?;

            if review.is_complete() {
                info!(
                    stage = "critic",
                    rounds = round,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Stage finished"
                );
                return Ok(files);
            }

            info!(
                stage = "critic",
                round,
                status = %review.status,
                patches = review.patches().len(),
                "Critic requested patches"
            );

            for patch in review.patches() {
                let relpath = normalize_relpath(&patch.relpath)?;
                ensure_not_reserved(&relpath)?;
                if let Some(lint) = &self.settings.skeleton_lint {
                    lint.enforce(&relpath, &patch.new_content)?;
                }
                if !files.contains_key(&relpath) {
                    debug!(relpath = %relpath, "Critic added a file outside the plan");
                }
                debug!(relpath = %relpath, reason = ?patch.reason, "Applied patch");
                files.insert(relpath, patch.new_content.clone());
            }
        }

        warn!(
            stage = "critic",
            rounds = max_rounds,
            "Critic never reported completion"
        );
        Err(PipelineError::CodeGen(
            "Critic could not reach completeness within patch budget".to_string(),
        ))
    }

    /// Stage 5: write the README and every file under the project directory.
    pub async fn pack(
        &self,
        profile: &VendorProfile,
        plan: &Plan,
        files: &FileSet,
        project_name: &str,
    ) -> Result<Bundle> {
        let started = Instant::now();
        info!(stage = "package", "Stage started");
        let plan_json = pretty(plan)?;
        let messages = vec![
            Message::system(profile.system_prompt),
            Message::user(render_template(
                profile.pack_prompt,
                &[("project_name", project_name), ("plan_json", &plan_json)],
            )),
        ];

        let readme = self.gateway.call_text(messages).await?;
        let bundle = write_bundle(&self.settings.out_dir, project_name, files, &readme).await?;

        info!(
            stage = "package",
            files = files.len(),
            project_dir = %bundle.project_dir.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stage finished"
        );
        Ok(bundle)
    }
}
