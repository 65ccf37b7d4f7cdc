//! LLM integration.
//!
//! Supports:
//! - **Azure OpenAI**: deployment-scoped chat completions with `api-key` auth
//! - **OpenAI**: any OpenAI-compatible chat completions endpoint with bearer auth
//!
//! Both speak the same chat-completions wire format and are served by
//! [`ChatCompletionsProvider`], exposed through the [`LlmProvider`] trait.

mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsProvider;
pub use provider::*;

use std::sync::Arc;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    AzureOpenAi,
    OpenAi,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    /// Model name (OpenAI) or deployment name (Azure).
    pub model: String,
    /// Endpoint root, e.g. `https://my-resource.openai.azure.com/`.
    pub base_url: String,
    /// Azure only.
    pub api_version: Option<String>,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = ChatCompletionsProvider::new(config)?;
    tracing::info!(
        backend = ?config.backend,
        model = %config.model,
        "LLM provider ready"
    );
    Ok(Arc::new(provider))
}
