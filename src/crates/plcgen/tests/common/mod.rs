//! Shared test doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use llm::{ChatModel, ChatRequest, ChatResponse, LlmError};
use plcgen::{ModelGateway, Orchestrator, PipelineSettings};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Replies with queued outputs in order and records every request.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push_error(&self, err: LlmError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Text of the user message of request `index`.
    pub fn user_prompt(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].messages[1].content.clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, request: ChatRequest) -> llm::Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(ChatResponse::from_text(text)),
            Some(Err(err)) => Err(err),
            None => Err(LlmError::ProviderError("script exhausted".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub fn orchestrator(model: Arc<ScriptedModel>, settings: PipelineSettings) -> Orchestrator {
    Orchestrator::new(ModelGateway::new(model), settings)
}

pub fn settings_in(out_dir: &Path) -> PipelineSettings {
    PipelineSettings::default().with_out_dir(out_dir)
}

pub fn contract_reply() -> String {
    json!({
        "modes": ["Auto", "Manual", "Maintenance"],
        "conveyors": [{"id": "CV1", "jam_timeout_ms": 3000}]
    })
    .to_string()
}

pub fn plan_reply(relpaths: &[&str]) -> String {
    let modules: Vec<Value> = relpaths
        .iter()
        .map(|relpath| json!({"relpath": relpath, "name": relpath, "type": "FB"}))
        .collect();
    json!({"modules": modules}).to_string()
}

pub fn complete_reply() -> String {
    json!({"status": "complete"}).to_string()
}

pub fn patch_reply(patches: &[(&str, &str)]) -> String {
    let patches: Vec<Value> = patches
        .iter()
        .map(|(relpath, content)| {
            json!({"relpath": relpath, "reason": "incomplete", "new_content": content})
        })
        .collect();
    json!({"status": "patch_required", "patches": patches}).to_string()
}
