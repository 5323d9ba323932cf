//! OCR capabilities and the fallback engine.
//!
//! Two remote capabilities are consumed here:
//!
//! - [`TextDetector`] - synchronous OCR over a single image's bytes.
//! - [`BatchOcr`] - asynchronous OCR over a stored document, writing result
//!   shards under an output prefix in the object store.
//!
//! [`OcrEngine`] sequences them and assembles sharded output.

mod engine;
mod shards;

pub use engine::{OcrEngine, OcrEngineConfig};
pub use shards::{natural_cmp, parse_shard, ShardOrder};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OcrResult;

/// Detection mode for single-image OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Dense document text detection producing a unified full-text annotation.
    Document,
    /// Simpler sparse text detection producing individual fragments.
    Text,
}

/// Result of a single-image detection call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnnotation {
    /// Unified full-text annotation, if the capability produced one.
    pub full_text: Option<String>,
    /// Individual text fragments in result order.
    #[serde(default)]
    pub fragments: Vec<String>,
}

impl TextAnnotation {
    /// Annotation with only a full-text field.
    pub fn full(text: impl Into<String>) -> Self {
        Self {
            full_text: Some(text.into()),
            fragments: Vec::new(),
        }
    }

    /// Annotation with only fragments.
    pub fn fragments(fragments: Vec<String>) -> Self {
        Self {
            full_text: None,
            fragments,
        }
    }

    /// Full text if present and non-blank.
    pub fn non_empty_full_text(&self) -> Option<&str> {
        self.full_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    /// Fragments concatenated in result order, falling back to the full text.
    pub fn joined(&self) -> String {
        if self.fragments.is_empty() {
            return self.full_text.clone().unwrap_or_default();
        }
        self.fragments.join("\n")
    }
}

/// Synchronous single-image OCR capability.
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Run text detection over raw image bytes.
    async fn detect(&self, image: &[u8], mode: DetectionMode) -> OcrResult<TextAnnotation>;
}

/// Handle to a submitted batch OCR job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    /// Capability-assigned job (operation) name.
    pub name: String,
}

impl JobHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Asynchronous batch OCR capability.
///
/// `wait` resolves when the remote job finishes. It is not expected to
/// bound itself: [`OcrEngine`] applies the time budget and cancellation,
/// dropping the wait future when either fires.
#[async_trait]
pub trait BatchOcr: Send + Sync {
    /// Submit one job reading `source` and writing shards under `output_prefix`.
    async fn submit_batch(&self, source: &str, output_prefix: &str) -> OcrResult<JobHandle>;

    /// Wait for the job to finish. Errors carry the remote diagnostic.
    async fn wait(&self, job: &JobHandle) -> OcrResult<()>;
}

/// One asynchronous OCR invocation.
#[derive(Debug, Clone)]
pub struct OcrJob {
    /// Per-invocation identifier.
    pub job_id: Uuid,
    /// Location prefix the remote job writes shards under.
    pub output_prefix: String,
    /// Ordering applied to shard names before assembly.
    pub shard_order: ShardOrder,
    /// Maximum time to wait for the job.
    pub timeout: Duration,
}

impl OcrJob {
    /// Create a job with a fresh random output prefix under `output_root`.
    ///
    /// The prefix embeds a v4 UUID, so concurrent jobs writing to the same
    /// bucket never share a prefix.
    pub fn new(output_root: &str, shard_order: ShardOrder, timeout: Duration) -> Self {
        let job_id = Uuid::new_v4();
        let root = output_root.trim_end_matches('/');
        let output_prefix = if root.is_empty() {
            format!("ocr-results-{}/", job_id.simple())
        } else {
            format!("{}/ocr-results-{}/", root, job_id.simple())
        };

        Self {
            job_id,
            output_prefix,
            shard_order,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_job_prefix_is_unique_per_invocation() {
        let prefixes: HashSet<String> = (0..1000)
            .map(|_| {
                OcrJob::new("gs://out", ShardOrder::Lexicographic, Duration::from_secs(1))
                    .output_prefix
            })
            .collect();
        assert_eq!(prefixes.len(), 1000);
    }

    #[test]
    fn test_job_prefix_layout() {
        let job = OcrJob::new("gs://out/", ShardOrder::Natural, Duration::from_secs(300));
        assert!(job.output_prefix.starts_with("gs://out/ocr-results-"));
        assert!(job.output_prefix.ends_with('/'));
        assert!(job.output_prefix.contains(&job.job_id.simple().to_string()));

        let bare = OcrJob::new("", ShardOrder::Natural, Duration::from_secs(1));
        assert!(bare.output_prefix.starts_with("ocr-results-"));
    }

    #[test]
    fn test_annotation_helpers() {
        assert_eq!(TextAnnotation::full("  ").non_empty_full_text(), None);
        assert_eq!(TextAnnotation::full("hi").non_empty_full_text(), Some("hi"));

        let frags = TextAnnotation::fragments(vec!["a".into(), "b".into()]);
        assert_eq!(frags.joined(), "a\nb");
        assert_eq!(TextAnnotation::default().joined(), "");
    }
}
