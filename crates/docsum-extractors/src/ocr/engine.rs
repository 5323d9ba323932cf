//! OCR fallback engine.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::shards::{parse_shard, ShardOrder};
use super::{BatchOcr, DetectionMode, OcrJob, TextDetector};
use crate::error::{OcrError, OcrResult};
use crate::store::ObjectStore;
use crate::types::{ExtractionResult, ExtractionStrategy};

/// Configuration for the OCR fallback engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrEngineConfig {
    /// Root under which batch jobs get their own output prefix. Google
    /// Vision writes only to `gs://` locations; a relative root is placed in
    /// the upload bucket when the server is assembled.
    pub output_root: String,
    /// Time budget for one batch job (default: 300s).
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Order applied to shard names before assembly. Vision names its
    /// shards `output-1-to-20.json`, `output-21-to-40.json`, ... which sort
    /// wrongly by name past 100 pages; use [`ShardOrder::Natural`] for them.
    pub shard_order: ShardOrder,
}

impl Default for OcrEngineConfig {
    fn default() -> Self {
        Self {
            output_root: "ocr-output".to_string(),
            timeout: Duration::from_secs(300),
            shard_order: ShardOrder::Lexicographic,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Drives single-image OCR and batch OCR with sharded result assembly.
///
/// Holds no per-job state: every call builds its own [`OcrJob`], so one
/// engine can serve concurrent extractions.
pub struct OcrEngine {
    detector: Arc<dyn TextDetector>,
    batch: Option<Arc<dyn BatchOcr>>,
    store: Arc<dyn ObjectStore>,
    config: OcrEngineConfig,
}

impl OcrEngine {
    /// Create an engine with single-image OCR only.
    pub fn new(
        detector: Arc<dyn TextDetector>,
        store: Arc<dyn ObjectStore>,
        config: OcrEngineConfig,
    ) -> Self {
        Self {
            detector,
            batch: None,
            store,
            config,
        }
    }

    /// Attach a batch OCR capability for image-only PDFs.
    pub fn with_batch(mut self, batch: Arc<dyn BatchOcr>) -> Self {
        self.batch = Some(batch);
        self
    }

    /// Whether image-only PDFs can go through batch OCR.
    pub fn supports_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Engine configuration.
    pub fn config(&self) -> &OcrEngineConfig {
        &self.config
    }

    /// Run single-image OCR.
    ///
    /// Tries document text detection first. When that yields no full-text
    /// annotation (or errors), retries once with plain text detection and
    /// concatenates the returned fragments. If both calls error the result
    /// has `success == false`.
    pub async fn detect_sync(&self, image: &[u8]) -> ExtractionResult {
        let first = match self.detector.detect(image, DetectionMode::Document).await {
            Ok(annotation) => Some(annotation),
            Err(e) => {
                warn!(error = %e, "Document text detection failed");
                None
            }
        };

        if let Some(text) = first.as_ref().and_then(|a| a.non_empty_full_text()) {
            debug!(chars = text.len(), "Document text detection succeeded");
            return ExtractionResult::new(text, ExtractionStrategy::OcrSync);
        }

        info!("No full-text annotation, retrying with text detection");
        match self.detector.detect(image, DetectionMode::Text).await {
            Ok(annotation) => ExtractionResult::new(annotation.joined(), ExtractionStrategy::OcrSync),
            Err(e) => {
                warn!(error = %e, "Text detection failed");
                if first.is_some() {
                    ExtractionResult::empty(ExtractionStrategy::OcrSync)
                } else {
                    ExtractionResult::failed(ExtractionStrategy::OcrSync)
                }
            }
        }
    }

    /// Run batch OCR over a stored document and assemble its shards.
    ///
    /// Submission and waiting share the configured budget; a timeout or
    /// cancellation drops the job future and no shard is read.
    pub async fn detect_async(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> OcrResult<ExtractionResult> {
        let batch = self
            .batch
            .as_ref()
            .ok_or_else(|| OcrError::Remote("no batch OCR capability configured".to_string()))?;

        if cancel.is_cancelled() {
            return Err(OcrError::Cancelled);
        }

        let job = OcrJob::new(
            &self.config.output_root,
            self.config.shard_order,
            self.config.timeout,
        );
        info!(
            job_id = %job.job_id,
            source = %source,
            output_prefix = %job.output_prefix,
            timeout_secs = job.timeout.as_secs(),
            "Submitting batch OCR job"
        );

        let run = async {
            let handle = batch.submit_batch(source, &job.output_prefix).await?;
            debug!(job_id = %job.job_id, operation = %handle.name, "Batch OCR job submitted");
            batch.wait(&handle).await
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(job_id = %job.job_id, "Batch OCR job cancelled");
                return Err(OcrError::Cancelled);
            }
            outcome = tokio::time::timeout(job.timeout, run) => match outcome {
                Err(_) => {
                    warn!(job_id = %job.job_id, "Batch OCR job timed out");
                    return Err(OcrError::Timeout { budget: job.timeout });
                }
                Ok(Err(e)) => return Err(e),
                Ok(Ok(())) => {}
            }
        }

        info!(job_id = %job.job_id, "Batch OCR job completed");
        let text = self.assemble(&job).await?;

        Ok(ExtractionResult::new(text, ExtractionStrategy::OcrAsync))
    }

    /// List, order, parse and concatenate the shards of a finished job.
    pub async fn assemble(&self, job: &OcrJob) -> OcrResult<String> {
        let mut shards = self.store.list(&job.output_prefix).await?;
        if shards.is_empty() {
            return Err(OcrError::NoOutput {
                prefix: job.output_prefix.clone(),
            });
        }
        job.shard_order.sort(&mut shards);

        let mut texts = Vec::with_capacity(shards.len());
        for shard in &shards {
            let content = self.store.read(shard).await?;
            let text = parse_shard(shard, &content)?;
            if !text.is_empty() {
                texts.push(text);
            }
        }

        debug!(shards = shards.len(), "Assembled batch OCR output");
        Ok(texts.join("\n"))
    }
}
