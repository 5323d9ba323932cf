//! Remote summarization capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DocsumResult;
use crate::types::Message;

/// One completion returned by a provider.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// `None` when the provider returned no candidate text.
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: None,
        }
    }

    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Provider-reported token accounting, when available.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Per-call overrides of [`LlmConfig`].
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    /// Output budget; the summarizer always sets this from the length profile.
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

impl GenerationOptions {
    /// Options carrying only an output budget.
    pub fn with_budget(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Default::default()
        }
    }
}

/// A model that turns a prompt into a completion.
///
/// One call is one remote request; implementations do not retry.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> DocsumResult<LlmResponse>;

    fn model_name(&self) -> &str;
}

/// Provider settings shared by every model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Empty means the provider's default model.
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Budget used when a call sets none.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Falls back to the provider's environment variable when unset.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Endpoint override for proxies and tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_top_p() -> f32 {
    0.95
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            api_key: None,
            base_url: None,
        }
    }
}
