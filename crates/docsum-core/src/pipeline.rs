//! End-to-end document pipeline.

use std::sync::Arc;

use docsum_extractors::ExtractionStrategy;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{DocsumError, DocsumResult};
use crate::extraction::ExtractionOrchestrator;
use crate::status::{StatusFields, StatusSink, StatusTracker};
use crate::summarize::SummaryRequestBuilder;
use crate::types::{DocumentStatus, LengthMode};

/// Result of a successful pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub document_id: String,
    pub summary: String,
    pub final_status: DocumentStatus,
    /// Strategy that produced the summarized text.
    pub strategy: ExtractionStrategy,
    pub length_mode: LengthMode,
}

/// Extraction, summarization and status tracking for one document at a time.
///
/// Holds only shared collaborator handles; concurrent runs each get their
/// own [`StatusTracker`].
pub struct DocumentPipeline {
    orchestrator: ExtractionOrchestrator,
    summarizer: SummaryRequestBuilder,
    sink: Arc<dyn StatusSink>,
}

impl DocumentPipeline {
    pub fn new(
        orchestrator: ExtractionOrchestrator,
        summarizer: SummaryRequestBuilder,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            orchestrator,
            summarizer,
            sink,
        }
    }

    /// Extract the document at `locator` and summarize it.
    ///
    /// The locator is the document id. Failures are recorded as `failed`
    /// with the error class and stage before being returned. A document that
    /// already left `uploaded` is refused with
    /// [`DocsumError::InvalidTransition`] and its record is left untouched.
    pub async fn extract_and_summarize(
        &self,
        locator: &str,
        extension: &str,
        length_mode: LengthMode,
    ) -> DocsumResult<PipelineOutcome> {
        self.run(locator, extension, length_mode, &CancellationToken::new())
            .await
    }

    /// Like [`extract_and_summarize`](Self::extract_and_summarize), stopping
    /// early with [`DocsumError::Cancelled`] once `cancel` fires.
    pub async fn run(
        &self,
        locator: &str,
        extension: &str,
        length_mode: LengthMode,
        cancel: &CancellationToken,
    ) -> DocsumResult<PipelineOutcome> {
        let run_id = Uuid::new_v4();
        info!(%run_id, locator = %locator, extension = %extension, mode = %length_mode, "Pipeline run started");

        let mut tracker = StatusTracker::new(locator, self.sink.clone());
        match self
            .run_stages(&mut tracker, locator, extension, length_mode, cancel)
            .await
        {
            Ok(outcome) => {
                info!(%run_id, strategy = %outcome.strategy, "Pipeline run completed");
                Ok(outcome)
            }
            Err(e) => {
                error!(%run_id, stage = %tracker.current(), class = e.class_name(), error = %e, "Pipeline run failed");
                // The stored status belongs to another run.
                if matches!(e, DocsumError::InvalidTransition { .. }) {
                    return Err(e);
                }
                if let Err(te) = tracker.fail(&e).await {
                    warn!(%run_id, error = %te, "Could not record failure");
                }
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        tracker: &mut StatusTracker,
        locator: &str,
        extension: &str,
        length_mode: LengthMode,
        cancel: &CancellationToken,
    ) -> DocsumResult<PipelineOutcome> {
        let extraction = self
            .orchestrator
            .extract(locator, extension, tracker, cancel)
            .await?;

        let fields = StatusFields {
            extracted_text: Some(extraction.text.clone()),
            ..Default::default()
        };
        tracker
            .advance_with(DocumentStatus::Summarizing, fields)
            .await?;

        let summary = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DocsumError::Cancelled),
            summary = self.summarizer.summarize(&extraction.text, length_mode) => summary?,
        };

        tracker.complete(&summary, length_mode).await?;

        Ok(PipelineOutcome {
            document_id: locator.to_string(),
            summary,
            final_status: tracker.current(),
            strategy: extraction.strategy,
            length_mode,
        })
    }
}
