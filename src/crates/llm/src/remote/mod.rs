//! Remote LLM provider implementations.
//!
//! Only the OpenAI-compatible chat completions API is supported. Other hosted
//! models are reachable through gateways that speak the same schema by
//! changing `base_url`.

pub mod openai;

pub use openai::OpenAiClient;
