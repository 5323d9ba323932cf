//! docsum-llm - Summarization model providers for docsum.
//!
//! Each provider implements [`docsum_core::Llm`] and issues exactly one
//! completion request per call. Retries and prompt shaping live in
//! `docsum-core`.
//!
//! # Supported Providers
//!
//! - **Gemini** - `generateContent` REST API over `reqwest`
//! - **OpenAI** (feature: `openai`) - Chat Completions via `async-openai`
//!
//! # Example
//!
//! ```ignore
//! use docsum_llm::LlmFactory;
//!
//! // Gemini with GEMINI_API_KEY from the environment
//! let llm = LlmFactory::gemini_with_model("gemini-2.5-flash")?;
//!
//! // Or whatever the loaded configuration names
//! let llm = LlmFactory::from_config(&config.llm)?;
//! ```

mod factory;
mod gemini;
mod openai;

pub use factory::LlmFactory;
pub use gemini::GeminiLlm;
pub use openai::OpenAIProvider;

// Re-export core types for convenience
pub use docsum_core::{GenerationOptions, Llm, LlmConfig, LlmProvider, LlmResponse};
