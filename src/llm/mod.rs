//! LLM integration for MomBot.
//!
//! The interview engine only talks to the `LlmProvider` trait. The shipped
//! backend is `OpenAiProvider`, a thin `reqwest` client for the
//! chat-completions API with SSE streaming.

pub mod openai;
pub mod provider;
pub mod sse;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::error::LlmError;

/// Default API root for OpenAI.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    /// Sent as the `OpenAI-Project` header when present.
    pub project_id: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(
        config.api_key.clone(),
        config.project_id.clone(),
        &config.base_url,
        &config.model,
    )?;
    tracing::info!(model = %config.model, base_url = %config.base_url, "Using OpenAI-compatible provider");
    Ok(Arc::new(provider))
}
