//! Google Cloud Vision client.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::GcpAuth;
use crate::error::{OcrError, OcrResult};
use crate::ocr::{BatchOcr, DetectionMode, JobHandle, TextAnnotation, TextDetector};

const VISION_API_URL: &str = "https://vision.googleapis.com/v1";
/// Per-request bound; long-running jobs are polled, never held open.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Vision REST client implementing both OCR capabilities.
pub struct GoogleVisionClient {
    client: Client,
    auth: GcpAuth,
    base_url: String,
    poll_interval: Duration,
    batch_size: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    full_text_annotation: Option<FullText>,
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct FullText {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: Status,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: &'static str,
}

impl GoogleVisionClient {
    pub fn new(auth: GcpAuth) -> OcrResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OcrError::Remote(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth,
            base_url: VISION_API_URL.to_string(),
            poll_interval: Duration::from_secs(2),
            batch_size: 20,
        })
    }

    /// Override the API base URL (emulators, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Interval between operation status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Pages per output shard for batch jobs.
    pub fn with_batch_size(mut self, pages: u32) -> Self {
        self.batch_size = pages.max(1);
        self
    }

    fn feature(mode: DetectionMode) -> Feature {
        Feature {
            feature_type: match mode {
                DetectionMode::Document => "DOCUMENT_TEXT_DETECTION",
                DetectionMode::Text => "TEXT_DETECTION",
            },
        }
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: String,
        body: &serde_json::Value,
    ) -> OcrResult<T> {
        let response = self
            .auth
            .apply(self.client.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| OcrError::Remote(format!("Vision API request failed: {}", e)))?;
        Self::decode(response).await
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> OcrResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OcrError::Remote(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(OcrError::Remote(format!(
                "Vision API error ({}): {}",
                status, message
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| OcrError::Remote(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl TextDetector for GoogleVisionClient {
    async fn detect(&self, image: &[u8], mode: DetectionMode) -> OcrResult<TextAnnotation> {
        let body = json!({
            "requests": [{
                "image": {"content": base64::engine::general_purpose::STANDARD.encode(image)},
                "features": [Self::feature(mode)],
            }]
        });

        let response: AnnotateResponse = self
            .post_json(format!("{}/images:annotate", self.base_url), &body)
            .await?;

        let Some(page) = response.responses.into_iter().next() else {
            return Ok(TextAnnotation::default());
        };
        if let Some(error) = page.error.filter(|e| !e.message.is_empty()) {
            return Err(OcrError::Remote(error.message));
        }

        // The first text annotation aggregates the whole image; the rest are words.
        let fragments = page
            .text_annotations
            .into_iter()
            .take(1)
            .map(|a| a.description)
            .filter(|d| !d.is_empty())
            .collect();

        Ok(TextAnnotation {
            full_text: page.full_text_annotation.map(|a| a.text),
            fragments,
        })
    }
}

#[async_trait]
impl BatchOcr for GoogleVisionClient {
    async fn submit_batch(&self, source: &str, output_prefix: &str) -> OcrResult<JobHandle> {
        let body = json!({
            "requests": [{
                "inputConfig": {
                    "gcsSource": {"uri": source},
                    "mimeType": "application/pdf",
                },
                "features": [Self::feature(DetectionMode::Document)],
                "outputConfig": {
                    "gcsDestination": {"uri": output_prefix},
                    "batchSize": self.batch_size,
                },
            }]
        });

        let operation: Operation = self
            .post_json(format!("{}/files:asyncBatchAnnotate", self.base_url), &body)
            .await?;
        if operation.name.is_empty() {
            return Err(OcrError::Remote(
                "Vision API returned no operation name".to_string(),
            ));
        }

        debug!(operation = %operation.name, "Batch annotation submitted");
        Ok(JobHandle::new(operation.name))
    }

    async fn wait(&self, job: &JobHandle) -> OcrResult<()> {
        let url = format!("{}/{}", self.base_url, job.name);
        loop {
            let response = self
                .auth
                .apply(self.client.get(&url))
                .send()
                .await
                .map_err(|e| OcrError::Remote(format!("Vision API request failed: {}", e)))?;
            let operation: Operation = Self::decode(response).await?;

            if operation.done {
                return match operation.error {
                    Some(error) => Err(OcrError::Remote(error.message)),
                    None => Ok(()),
                };
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
