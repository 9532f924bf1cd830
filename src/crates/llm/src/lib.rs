//! Chat model layer for plcgen.
//!
//! Defines the provider-agnostic [`ChatModel`] trait together with the
//! message and request types it consumes, and ships one concrete provider:
//! an OpenAI-compatible chat completions client.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::remote::OpenAiClient;
//! use llm::{ChatModel, ChatRequest, Message, RemoteLlmConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteLlmConfig::new(
//!         std::env::var("OPENAI_API_KEY")?,
//!         "https://api.openai.com/v1",
//!         "gpt-4o-mini",
//!     );
//!     let client = OpenAiClient::new(config)?;
//!
//!     let request = ChatRequest::new(vec![
//!         Message::system("You write IEC 61131-3 Structured Text."),
//!         Message::user("Write a TON-based debounce function block."),
//!     ])
//!     .with_temperature(0.2);
//!
//!     let response = client.chat(request).await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod messages;
pub mod remote;
pub mod traits;

pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use messages::{Message, MessageRole};
pub use traits::{ChatConfig, ChatModel, ChatRequest, ChatResponse, ResponseFormat, UsageMetadata};
