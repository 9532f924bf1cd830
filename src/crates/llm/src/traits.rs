//! Provider-agnostic chat model interface.
//!
//! The pipeline only ever talks to a [`ChatModel`]. Concrete providers live
//! under [`crate::remote`]; tests plug in scripted implementations.

use crate::error::Result;
use crate::messages::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Output format hint sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form text.
    #[default]
    Text,
    /// Ask the provider to emit a single JSON object. Providers may ignore it.
    JsonObject,
}

/// Generation parameters for a single request.
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    /// Sampling temperature (0.0-2.0).
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
}

/// A request to a chat model.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub config: ChatConfig,
}

impl ChatRequest {
    /// Create a request with default configuration.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Request JSON-object output.
    pub fn json_mode(mut self) -> Self {
        self.config.response_format = ResponseFormat::JsonObject;
        self
    }

    pub fn is_json_mode(&self) -> bool {
        self.config.response_format == ResponseFormat::JsonObject
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

impl UsageMetadata {
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// A complete response from a chat model.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant message.
    pub message: Message,
    pub usage: Option<UsageMetadata>,
    /// Provider-specific extras such as the resolved model and finish reason.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ChatResponse {
    /// Build a response holding only assistant text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(text),
            usage: None,
            metadata: HashMap::new(),
        }
    }

    pub fn text(&self) -> &str {
        self.message.text()
    }

    /// Why the provider stopped generating, e.g. `"stop"` or `"length"`.
    pub fn finish_reason(&self) -> Option<&str> {
        self.metadata
            .get("finish_reason")
            .and_then(|v| v.as_str())
            .filter(|reason| !reason.is_empty())
    }

    /// Whether the provider cut the output short at its token limit.
    pub fn is_truncated(&self) -> bool {
        self.finish_reason() == Some("length")
    }
}

/// Core trait for chat-based language models.
///
/// Implementations make exactly one provider call per `chat` invocation and
/// never retry internally.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the request and wait for the complete response.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Identifier of the backing model, for logging.
    fn model_name(&self) -> &str;
}
