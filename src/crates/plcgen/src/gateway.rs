//! Single-call wrapper around the chat model.
//!
//! One invocation is exactly one outbound call. Transport and provider errors
//! propagate unchanged; retrying is the caller's business.

use crate::coerce::{coerce_json, JsonObject};
use crate::error::Result;
use llm::{ChatModel, ChatRequest, Message};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Sends role-tagged messages to the configured model.
#[derive(Clone)]
pub struct ModelGateway {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl ModelGateway {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Free-text call. Returns the raw assistant text.
    pub async fn call_text(&self, messages: Vec<Message>) -> Result<String> {
        let request = ChatRequest::new(messages).with_temperature(self.temperature);
        self.send(request).await
    }

    /// JSON-mode call. The reply is still run through [`coerce_json`] since
    /// providers do not always honour the hint.
    pub async fn call_json(&self, messages: Vec<Message>) -> Result<JsonObject> {
        let request = ChatRequest::new(messages)
            .with_temperature(self.temperature)
            .json_mode();
        let raw = self.send(request).await?;
        coerce_json(&raw)
    }

    async fn send(&self, request: ChatRequest) -> Result<String> {
        let json_mode = request.is_json_mode();
        let started = Instant::now();

        let response = match self.model.chat(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    model = self.model.model_name(),
                    json_mode,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    retryable = e.is_retryable(),
                    auth = e.is_auth_error(),
                    "Model call failed: {}",
                    e
                );
                return Err(e.into());
            }
        };

        debug!(
            model = self.model.model_name(),
            json_mode,
            elapsed_ms = started.elapsed().as_millis() as u64,
            output_chars = response.text().len(),
            input_tokens = response.usage.map(|u| u.input_tokens),
            output_tokens = response.usage.map(|u| u.output_tokens),
            finish_reason = response.finish_reason(),
            "Model call finished"
        );
        if response.is_truncated() {
            warn!(
                model = self.model.model_name(),
                output_chars = response.text().len(),
                "Model output hit the token limit"
            );
        }
        trace!(output = response.text(), "Raw model output");

        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use async_trait::async_trait;
    use llm::{ChatResponse, LlmError};
    use std::sync::Mutex;

    struct EchoModel {
        reply: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl EchoModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn chat(&self, request: ChatRequest) -> llm::Result<ChatResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(ChatResponse::from_text(self.reply.clone()))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct TruncatingModel;

    #[async_trait]
    impl ChatModel for TruncatingModel {
        async fn chat(&self, _request: ChatRequest) -> llm::Result<ChatResponse> {
            let mut response = ChatResponse::from_text("{\"status\": \"complete\"}");
            response.metadata.insert(
                "finish_reason".to_string(),
                serde_json::Value::String("length".to_string()),
            );
            Ok(response)
        }

        fn model_name(&self) -> &str {
            "truncating"
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn chat(&self, _request: ChatRequest) -> llm::Result<ChatResponse> {
            Err(LlmError::AuthenticationError("invalid api key".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_call_text_uses_text_mode_and_temperature() {
        let model = Arc::new(EchoModel::new("README body"));
        let gateway = ModelGateway::new(model.clone()).with_temperature(0.5);

        let text = gateway
            .call_text(vec![Message::system("s"), Message::user("u")])
            .await
            .unwrap();

        assert_eq!(text, "README body");
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].is_json_mode());
        assert_eq!(seen[0].config.temperature, Some(0.5));
        assert_eq!(seen[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_call_json_coerces_prose() {
        let model = Arc::new(EchoModel::new("Sure! {\"status\": \"complete\",} done"));
        let gateway = ModelGateway::new(model.clone());

        let obj = gateway.call_json(vec![Message::user("review")]).await.unwrap();

        assert_eq!(obj["status"], "complete");
        assert!(model.seen.lock().unwrap()[0].is_json_mode());
        assert_eq!(gateway.temperature(), DEFAULT_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_call_json_malformed() {
        let gateway = ModelGateway::new(Arc::new(EchoModel::new("no json here")));
        let err = gateway.call_json(vec![Message::user("x")]).await.unwrap_err();
        assert!(matches!(err, PipelineError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn test_provider_error_propagates_unchanged() {
        let gateway = ModelGateway::new(Arc::new(FailingModel));
        let err = gateway.call_text(vec![Message::user("x")]).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Model(LlmError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_reply_is_still_returned() {
        let gateway = ModelGateway::new(Arc::new(TruncatingModel));
        let obj = gateway.call_json(vec![Message::user("review")]).await.unwrap();
        assert_eq!(obj["status"], "complete");
    }

    #[tokio::test]
    async fn test_rate_limit_propagates_as_model_error() {
        struct RateLimitedModel;

        #[async_trait]
        impl ChatModel for RateLimitedModel {
            async fn chat(&self, _request: ChatRequest) -> llm::Result<ChatResponse> {
                Err(LlmError::RateLimitExceeded("429".to_string()))
            }

            fn model_name(&self) -> &str {
                "limited"
            }
        }

        let gateway = ModelGateway::new(Arc::new(RateLimitedModel));
        match gateway.call_json(vec![Message::user("x")]).await.unwrap_err() {
            PipelineError::Model(e) => {
                assert!(e.is_retryable());
                assert!(!e.is_auth_error());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
