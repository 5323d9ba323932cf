//! Factory for creating LLM providers.

use std::sync::Arc;

use docsum_core::{DocsumResult, Llm, LlmConfig, LlmProvider, LlmProviderConfig};

use crate::gemini::GeminiLlm;
use crate::openai::OpenAIProvider;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> DocsumResult<Arc<dyn Llm>> {
        match provider {
            LlmProvider::Gemini => {
                let llm = GeminiLlm::new(config)?;
                Ok(Arc::new(llm))
            }
            LlmProvider::OpenAI => {
                let llm = OpenAIProvider::new(config)?;
                Ok(Arc::new(llm))
            }
        }
    }

    /// Create the provider named in a loaded configuration section.
    pub fn from_config(config: &LlmProviderConfig) -> DocsumResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Create a Gemini LLM provider with a specific model.
    pub fn gemini_with_model(model: impl Into<String>) -> DocsumResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Gemini, config)
    }

    /// Create an OpenAI LLM provider with a specific model.
    pub fn openai_with_model(model: impl Into<String>) -> DocsumResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::OpenAI, config)
    }
}
