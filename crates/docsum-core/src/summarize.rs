//! Summarization request shaping.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::{DocsumError, DocsumResult, ErrorCode};
use crate::traits::{GenerationOptions, Llm};
use crate::types::{LengthMode, LengthProfile, Message};

/// Default minimum number of whitespace-delimited input tokens.
pub const DEFAULT_MIN_INPUT_TOKENS: usize = 20;

const SYSTEM_PROMPT: &str = "You are an expert technical summarizer. Produce a single, concise \
and coherent abstractive summary that captures the main ideas and important details of the \
document. Do not restate these instructions.";

/// Build the user prompt for a document and length profile.
pub fn summary_prompt(text: &str, profile: &LengthProfile) -> String {
    format!(
        "Summarize the following document. The summary should be approximately {}% of the \
         original text length, or less if possible, and must fit within {} tokens.\n\n\
         --- START DOCUMENT ---\n{}\n--- END DOCUMENT ---",
        profile.ratio_percent(),
        profile.max_output_tokens,
        text
    )
}

/// Turns extracted text and a length mode into one summarization call.
pub struct SummaryRequestBuilder {
    llm: Arc<dyn Llm>,
    min_input_tokens: usize,
}

impl SummaryRequestBuilder {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            min_input_tokens: DEFAULT_MIN_INPUT_TOKENS,
        }
    }

    /// Override the minimum input size.
    pub fn with_min_input_tokens(mut self, tokens: usize) -> Self {
        self.min_input_tokens = tokens;
        self
    }

    pub fn min_input_tokens(&self) -> usize {
        self.min_input_tokens
    }

    /// Reject inputs too short to summarize.
    pub fn check_input(&self, text: &str) -> DocsumResult<()> {
        let tokens = text.split_whitespace().count();
        if tokens < self.min_input_tokens {
            return Err(DocsumError::InputTooShort {
                tokens,
                minimum: self.min_input_tokens,
            });
        }
        Ok(())
    }

    /// System and user messages for one request.
    pub fn build_messages(text: &str, profile: &LengthProfile) -> Vec<Message> {
        vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(summary_prompt(text, profile)),
        ]
    }

    /// Summarize `text` at the given length. Makes at most one remote call.
    #[instrument(skip(self, text), fields(model = self.llm.model_name()))]
    pub async fn summarize(&self, text: &str, mode: LengthMode) -> DocsumResult<String> {
        self.check_input(text)?;

        let profile = mode.profile();
        let messages = Self::build_messages(text, profile);
        let options = GenerationOptions::with_budget(profile.max_output_tokens);

        let response = self
            .llm
            .generate(&messages, Some(options))
            .await
            .map_err(|e| match e {
                e @ DocsumError::SummarizationFailed { .. } => e,
                e => DocsumError::SummarizationFailed {
                    detail: e.to_string(),
                    code: ErrorCode::LlmGenerationFailed,
                    source: Some(Box::new(e)),
                },
            })?;

        let summary = response.content_or_empty().trim();
        if summary.is_empty() {
            return Err(DocsumError::SummarizationFailed {
                detail: "model returned an empty completion".to_string(),
                code: ErrorCode::LlmEmptyResponse,
                source: None,
            });
        }

        info!(mode = %mode, chars = summary.len(), "Summary generated");
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::LlmResponse;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        Model {}

        #[async_trait]
        impl Llm for Model {
            async fn generate(
                &self,
                messages: &[Message],
                options: Option<GenerationOptions>,
            ) -> DocsumResult<LlmResponse>;

            fn model_name(&self) -> &str;
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn model() -> MockModel {
        let mut llm = MockModel::new();
        llm.expect_model_name().return_const("mock".to_string());
        llm
    }

    #[tokio::test]
    async fn test_short_input_never_calls_model() {
        let mut llm = model();
        llm.expect_generate().times(0);

        let builder = SummaryRequestBuilder::new(Arc::new(llm));
        let err = builder.summarize(&words(19), LengthMode::Short).await.unwrap_err();
        assert!(matches!(
            err,
            DocsumError::InputTooShort {
                tokens: 19,
                minimum: 20
            }
        ));
    }

    #[tokio::test]
    async fn test_budget_follows_mode() {
        for (mode, budget) in [
            (LengthMode::Short, 256),
            (LengthMode::Medium, 512),
            (LengthMode::Long, 1024),
        ] {
            let mut llm = model();
            llm.expect_generate()
                .withf(move |messages, options| {
                    messages.len() == 2
                        && options.as_ref().and_then(|o| o.max_tokens) == Some(budget)
                })
                .times(1)
                .returning(|_, _| Ok(LlmResponse::text("  A summary.  ")));

            let builder = SummaryRequestBuilder::new(Arc::new(llm));
            let summary = builder.summarize(&words(40), mode).await.unwrap();
            assert_eq!(summary, "A summary.");
        }
    }

    #[tokio::test]
    async fn test_remote_error_is_summarization_failure() {
        let mut llm = model();
        llm.expect_generate()
            .times(1)
            .returning(|_, _| Err(DocsumError::Internal("503 from provider".into())));

        let builder = SummaryRequestBuilder::new(Arc::new(llm));
        let err = builder.summarize(&words(40), LengthMode::Medium).await.unwrap_err();
        assert_eq!(err.class_name(), "SummarizationFailed");
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_provider_summarization_error_passes_through() {
        let mut llm = model();
        llm.expect_generate()
            .times(1)
            .returning(|_, _| Err(DocsumError::summarization("quota exhausted")));

        let builder = SummaryRequestBuilder::new(Arc::new(llm));
        let err = builder.summarize(&words(40), LengthMode::Short).await.unwrap_err();
        assert_eq!(err.to_string(), "Summarization failed: quota exhausted");
    }

    #[tokio::test]
    async fn test_empty_completion_is_failure() {
        let mut llm = model();
        llm.expect_generate()
            .times(1)
            .returning(|_, _| Ok(LlmResponse::default()));

        let builder = SummaryRequestBuilder::new(Arc::new(llm));
        let err = builder.summarize(&words(40), LengthMode::Long).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::LlmEmptyResponse);
    }

    #[test]
    fn test_prompt_embeds_ratio_and_budget() {
        let prompt = summary_prompt("body text", LengthMode::Short.profile());
        assert!(prompt.contains("10%"));
        assert!(prompt.contains("256 tokens"));
        assert!(prompt.contains("body text"));
    }

    #[test]
    fn test_threshold_is_configurable() {
        let builder = SummaryRequestBuilder::new(Arc::new(model())).with_min_input_tokens(3);
        assert!(builder.check_input("one two three").is_ok());
        assert!(builder.check_input("one two").is_err());
    }
}
