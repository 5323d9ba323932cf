//! Google Gemini LLM provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use docsum_core::{
    split_system, DocsumError, DocsumResult, GenerationOptions, Llm, LlmConfig, LlmResponse,
    Message, MessageRole, TokenUsage,
};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini LLM provider using the `generateContent` REST endpoint.
pub struct GeminiLlm {
    client: Client,
    api_key: SecretString,
    config: LlmConfig,
    base_url: String,
    thinking_budget: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<GeminiThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiThinkingConfig {
    thinking_budget: u32,
}

/// Thinking tokens count against `maxOutputTokens`; flash models can turn
/// thinking off so the whole length budget goes to the summary.
fn default_thinking_budget(model: &str) -> Option<u32> {
    model.starts_with("gemini-2.5-flash").then_some(0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiLlm {
    /// Create a new Gemini LLM provider.
    pub fn new(config: LlmConfig) -> DocsumResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                DocsumError::Configuration("Gemini API key not found. Set GEMINI_API_KEY environment variable or provide api_key in config.".to_string())
            })?;

        let client = Client::builder()
            .build()
            .map_err(|e| DocsumError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut config = config;
        config.api_key = None;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            client,
            api_key: SecretString::new(api_key),
            thinking_budget: default_thinking_budget(&config.model),
            config,
            base_url,
        })
    }

    /// Override the thinking budget; `None` leaves it to the model.
    pub fn with_thinking_budget(mut self, budget: Option<u32>) -> Self {
        self.thinking_budget = budget;
        self
    }

    fn build_request(&self, messages: &[Message], options: GenerationOptions) -> GeminiRequest {
        let (system, turns) = split_system(messages);

        let contents = turns
            .into_iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        MessageRole::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        GeminiRequest {
            system_instruction: system.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: Some(text) }],
            }),
            contents,
            generation_config: GeminiGenerationConfig {
                max_output_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
                temperature: options.temperature.unwrap_or(self.config.temperature),
                top_p: options.top_p.unwrap_or(self.config.top_p),
                thinking_config: self
                    .thinking_budget
                    .map(|thinking_budget| GeminiThinkingConfig { thinking_budget }),
            },
        }
    }
}

fn parse_response(body: &str) -> DocsumResult<LlmResponse> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| DocsumError::summarization(format!("Failed to parse Gemini response: {}", e)))?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(DocsumError::summarization(format!(
            "Gemini blocked the prompt: {}",
            reason
        )));
    }

    let content = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| {
            c.parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .filter(|text| !text.is_empty());

    let usage = response.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    Ok(LlmResponse { content, usage })
}

#[async_trait]
impl Llm for GeminiLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> DocsumResult<LlmResponse> {
        let request = self.build_request(messages, options.unwrap_or_default());
        debug!(
            model = %self.config.model,
            max_output_tokens = request.generation_config.max_output_tokens,
            "Sending Gemini request"
        );

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.config.model
            ))
            .header("x-goog-api-key", self.api_key.expose_secret().as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| DocsumError::summarization(format!("Gemini API request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DocsumError::summarization(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let error: Result<GeminiError, _> = serde_json::from_str(&body);
            let message = error
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.clone());
            return Err(DocsumError::summarization(format!(
                "Gemini API error ({}): {}",
                status, message
            )));
        }

        parse_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn llm(base_url: Option<String>) -> GeminiLlm {
        GeminiLlm::new(LlmConfig {
            api_key: Some("test-key".into()),
            base_url,
            ..Default::default()
        })
        .unwrap()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_default_model() {
        assert_eq!(llm(None).model_name(), DEFAULT_MODEL);

        let custom = GeminiLlm::new(LlmConfig {
            model: "gemini-2.5-pro".into(),
            api_key: Some("k".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(custom.model_name(), "gemini-2.5-pro");
    }

    #[test]
    fn test_request_shape() {
        let llm = llm(None);
        let messages = vec![
            Message::system("Be brief."),
            Message::user("Summarize this."),
        ];
        let request = llm.build_request(
            &messages,
            GenerationOptions {
                max_tokens: Some(256),
                ..Default::default()
            },
        );
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert_eq!(value["contents"].as_array().unwrap().len(), 1);
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 256);
        assert!(value["generationConfig"]["topP"].is_number());
    }

    #[test]
    fn test_flash_turns_thinking_off() {
        let request =
            llm(None).build_request(&[Message::user("hi")], GenerationOptions::with_budget(256));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(value["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
    }

    #[test]
    fn test_thinking_config_omitted_for_other_models() {
        let pro = GeminiLlm::new(LlmConfig {
            model: "gemini-2.5-pro".into(),
            api_key: Some("k".into()),
            ..Default::default()
        })
        .unwrap();
        let request = pro.build_request(&[Message::user("hi")], GenerationOptions::default());
        let value = serde_json::to_value(&request).unwrap();
        assert!(value["generationConfig"].get("thinkingConfig").is_none());

        let tuned = llm(None).with_thinking_budget(Some(128));
        let request = tuned.build_request(&[Message::user("hi")], GenerationOptions::default());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationConfig"]["thinkingConfig"]["thinkingBudget"], 128);
    }

    #[test]
    fn test_parse_joins_parts_and_reads_usage() {
        let body = json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Part one. "}, {"text": "Part two."}]}}],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 8, "totalTokenCount": 128}
        })
        .to_string();

        let response = parse_response(&body).unwrap();
        assert_eq!(response.content_or_empty(), "Part one. Part two.");
        assert_eq!(response.usage.unwrap().total_tokens, 128);
    }

    #[test]
    fn test_parse_without_candidates_is_empty() {
        let response = parse_response("{}").unwrap();
        assert!(response.content.is_none());

        let blocked = parse_response(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert!(blocked.unwrap_err().to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_generate_against_local_endpoint() {
        let router = Router::new().route(
            "/models/:call",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["x-goog-api-key"], "test-key");
                let budget = body["generationConfig"]["maxOutputTokens"].clone();
                Json(json!({
                    "candidates": [{"content": {"parts": [{"text": format!("budget {}", budget)}]}}]
                }))
            }),
        );
        let base = serve(router).await;

        let response = llm(Some(base))
            .generate(
                &[Message::user("hello")],
                Some(GenerationOptions {
                    max_tokens: Some(512),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
        assert_eq!(response.content_or_empty(), "budget 512");
    }

    #[tokio::test]
    async fn test_error_body_is_reported() {
        let router = Router::new().route(
            "/models/:call",
            post(|| async {
                (
                    axum::http::StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"code": 429, "message": "Resource exhausted"}})),
                )
            }),
        );
        let base = serve(router).await;

        let err = llm(Some(base))
            .generate(&[Message::user("hello")], None)
            .await
            .unwrap_err();
        assert_eq!(err.class_name(), "SummarizationFailed");
        assert!(err.to_string().contains("Resource exhausted"));
    }
}
