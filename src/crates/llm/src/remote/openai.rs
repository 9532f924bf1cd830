//! OpenAI-compatible chat completions client.
//!
//! Works against api.openai.com and any gateway that speaks the same
//! `/chat/completions` schema. JSON mode maps to
//! `response_format: {"type": "json_object"}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::remote::OpenAiClient;
//! use llm::{ChatModel, ChatRequest, Message, RemoteLlmConfig};
//!
//! let config = RemoteLlmConfig::new(
//!     std::env::var("OPENAI_API_KEY")?,
//!     "https://api.openai.com/v1",
//!     "gpt-4o-mini",
//! );
//! let client = OpenAiClient::new(config)?;
//!
//! let request = ChatRequest::new(vec![Message::user("Hello!")]).json_mode();
//! let response = client.chat(request).await?;
//! ```

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use crate::messages::{Message, MessageRole};
use crate::traits::{ChatModel, ChatRequest, ChatResponse, ResponseFormat, UsageMetadata};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RemoteLlmConfig {
        &self.config
    }

    fn convert_message(&self, msg: &Message) -> OpenAiMessage {
        OpenAiMessage {
            role: msg.role.as_str().to_string(),
            content: Some(msg.content.clone()),
        }
    }

    fn build_request(&self, request: &ChatRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| self.convert_message(m))
                .collect(),
            temperature: request.config.temperature,
            response_format: match request.config.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::JsonObject => Some(OpenAiResponseFormat {
                    kind: "json_object".to_string(),
                }),
            },
            stream: false,
        }
    }

    fn convert_response(&self, openai_resp: OpenAiResponse) -> Result<ChatResponse> {
        let choice = openai_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| LlmError::InvalidResponse("choice has no message content".to_string()))?;

        let usage = openai_resp
            .usage
            .as_ref()
            .map(|u| UsageMetadata::new(u.prompt_tokens, u.completion_tokens));

        let mut metadata = HashMap::new();
        metadata.insert(
            "model".to_string(),
            serde_json::Value::String(openai_resp.model),
        );
        metadata.insert(
            "finish_reason".to_string(),
            serde_json::Value::String(choice.finish_reason.unwrap_or_default()),
        );

        Ok(ChatResponse {
            message: Message::new(MessageRole::Assistant, content),
            usage,
            metadata,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = self.config.chat_completions_url();
        let req_body = self.build_request(&request);

        debug!(
            model = %self.config.model,
            messages = req_body.messages.len(),
            json_mode = request.is_json_mode(),
            "Sending chat completion request"
        );

        let mut req = self
            .client
            .post(&url)
            .json(&req_body)
            .header("Authorization", format!("Bearer {}", self.config.api_key));

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationError(error_text),
                429 => LlmError::RateLimitExceeded(error_text),
                _ => LlmError::ProviderError(format!("OpenAI API error {}: {}", status, error_text)),
            });
        }

        let openai_resp: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        self.convert_response(openai_resp)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAiResponseFormat>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> OpenAiClient {
        let config = RemoteLlmConfig::new("test-key", "https://api.openai.com/v1", "gpt-4o-mini");
        OpenAiClient::new(config).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_message_conversion_all_roles() {
        let client = client();

        let sys = client.convert_message(&Message::system("You are a PLC engineer"));
        assert_eq!(sys.role, "system");
        assert_eq!(sys.content, Some("You are a PLC engineer".to_string()));

        let user = client.convert_message(&Message::user("Hello"));
        assert_eq!(user.role, "user");

        let asst = client.convert_message(&Message::assistant("Hi there!"));
        assert_eq!(asst.role, "assistant");
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let client = client();
        let request = ChatRequest::new(vec![Message::user("give me json")])
            .with_temperature(0.2)
            .json_mode();

        let body = serde_json::to_value(client.build_request(&request)).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], false);
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_text_mode_omits_response_format() {
        let client = client();
        let request = ChatRequest::new(vec![Message::user("free text")]);

        let body = serde_json::to_value(client.build_request(&request)).unwrap();
        assert!(body.get("response_format").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_config_with_custom_timeout() {
        let config = RemoteLlmConfig::new("test-key", "https://api.openai.com/v1", "gpt-4o")
            .with_timeout(Duration::from_secs(10));

        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_response_conversion_basic() {
        let client = client();

        let raw = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1234567890,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "FUNCTION_BLOCK FB_Conveyor"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
        }"#;
        let openai_response: OpenAiResponse = serde_json::from_str(raw).unwrap();

        let response = client.convert_response(openai_response).unwrap();

        assert_eq!(response.text(), "FUNCTION_BLOCK FB_Conveyor");
        assert_eq!(response.message.role, MessageRole::Assistant);
        assert_eq!(response.usage.unwrap().input_tokens, 10);
        assert_eq!(response.usage.unwrap().output_tokens, 20);
        assert_eq!(response.finish_reason(), Some("stop"));
        assert!(!response.is_truncated());
    }

    #[test]
    fn test_response_without_choices_is_invalid() {
        let client = client();
        let openai_response = OpenAiResponse {
            model: "gpt-4o-mini".to_string(),
            choices: vec![],
            usage: None,
        };

        let err = client.convert_response(openai_response).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn test_response_without_content_is_invalid() {
        let client = client();
        let openai_response = OpenAiResponse {
            model: "gpt-4o-mini".to_string(),
            choices: vec![OpenAiChoice {
                message: OpenAiMessage {
                    role: "assistant".to_string(),
                    content: None,
                },
                finish_reason: Some("length".to_string()),
            }],
            usage: None,
        };

        let err = client.convert_response(openai_response).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
