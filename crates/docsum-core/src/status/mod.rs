//! Per-document status tracking.
//!
//! A [`StatusTracker`] is created for each pipeline run. It validates every
//! transition against the document lifecycle and forwards accepted ones to
//! a [`StatusSink`]. Sink failures are logged and never abort the run, except
//! a sink refusing the transition against its own stored status: that means
//! the document already moved on (a finished or concurrent run) and the run
//! must stop.

mod sqlite;

pub use sqlite::{SqliteDocumentStore, StatusHistoryRecord};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{DocsumError, DocsumResult};
use crate::types::{DocumentStatus, LastError, LengthMode};

/// Fields written alongside a status transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusFields {
    pub extracted_text: Option<String>,
    pub summary: Option<String>,
    pub length_mode: Option<LengthMode>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error: Option<LastError>,
}

/// External observer of document status.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Persist one transition for a document.
    async fn record_transition(
        &self,
        document_id: &str,
        status: DocumentStatus,
        fields: StatusFields,
    ) -> DocsumResult<()>;
}

/// Validates and records the status transitions of one pipeline run.
pub struct StatusTracker {
    document_id: String,
    current: DocumentStatus,
    sink: Arc<dyn StatusSink>,
}

impl StatusTracker {
    /// Tracker for a run starting from `uploaded`.
    pub fn new(document_id: impl Into<String>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            document_id: document_id.into(),
            current: DocumentStatus::Uploaded,
            sink,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Last accepted state.
    pub fn current(&self) -> DocumentStatus {
        self.current
    }

    /// Move to `next` with no extra fields.
    pub async fn advance(&mut self, next: DocumentStatus) -> DocsumResult<()> {
        self.advance_with(next, StatusFields::default()).await
    }

    /// Move to `next`, recording `fields` with the transition.
    pub async fn advance_with(
        &mut self,
        next: DocumentStatus,
        fields: StatusFields,
    ) -> DocsumResult<()> {
        if !self.current.can_transition_to(next) {
            return Err(DocsumError::InvalidTransition {
                document_id: self.document_id.clone(),
                from: self.current,
                to: next,
            });
        }

        debug!(document_id = %self.document_id, from = %self.current, to = %next, "Status transition");

        match self
            .sink
            .record_transition(&self.document_id, next, fields)
            .await
        {
            Err(e @ DocsumError::InvalidTransition { .. }) => return Err(e),
            Err(e) => {
                warn!(document_id = %self.document_id, status = %next, error = %e, "Failed to record status")
            }
            Ok(()) => {}
        }
        self.current = next;
        Ok(())
    }

    /// Record successful completion.
    pub async fn complete(&mut self, summary: &str, mode: LengthMode) -> DocsumResult<()> {
        let fields = StatusFields {
            summary: Some(summary.to_string()),
            length_mode: Some(mode),
            processed_at: Some(Utc::now()),
            ..Default::default()
        };
        self.advance_with(DocumentStatus::Completed, fields).await
    }

    /// Record a failure at the current stage.
    pub async fn fail(&mut self, error: &DocsumError) -> DocsumResult<()> {
        let fields = StatusFields {
            processed_at: Some(Utc::now()),
            error: Some(LastError {
                class: error.class_name().to_string(),
                stage: self.current,
                detail: error.to_string(),
            }),
            ..Default::default()
        };
        self.advance_with(DocumentStatus::Failed, fields).await
    }
}

/// A transition captured by [`MemoryStatusSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTransition {
    pub status: DocumentStatus,
    pub fields: StatusFields,
}

/// In-memory sink keeping every transition, keyed by document.
#[derive(Debug, Default)]
pub struct MemoryStatusSink {
    records: Mutex<HashMap<String, Vec<RecordedTransition>>>,
}

impl MemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transitions recorded for a document, oldest first.
    pub fn transitions(&self, document_id: &str) -> Vec<RecordedTransition> {
        self.records
            .lock()
            .map(|records| records.get(document_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Status names recorded for a document, oldest first.
    pub fn statuses(&self, document_id: &str) -> Vec<DocumentStatus> {
        self.transitions(document_id)
            .into_iter()
            .map(|t| t.status)
            .collect()
    }
}

#[async_trait]
impl StatusSink for MemoryStatusSink {
    async fn record_transition(
        &self,
        document_id: &str,
        status: DocumentStatus,
        fields: StatusFields,
    ) -> DocsumResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| DocsumError::Internal("status sink lock poisoned".to_string()))?;
        records
            .entry(document_id.to_string())
            .or_default()
            .push(RecordedTransition { status, fields });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocumentStatus::*;

    struct BrokenSink;

    #[async_trait]
    impl StatusSink for BrokenSink {
        async fn record_transition(
            &self,
            _document_id: &str,
            _status: DocumentStatus,
            _fields: StatusFields,
        ) -> DocsumResult<()> {
            Err(DocsumError::database("disk full"))
        }
    }

    #[tokio::test]
    async fn test_full_run_is_recorded() {
        let sink = Arc::new(MemoryStatusSink::new());
        let mut tracker = StatusTracker::new("doc", sink.clone());

        tracker.advance(Extracting).await.unwrap();
        tracker.advance(OcrFallback).await.unwrap();
        tracker.advance(Summarizing).await.unwrap();
        tracker.complete("short summary", LengthMode::Short).await.unwrap();

        assert_eq!(
            sink.statuses("doc"),
            vec![Extracting, OcrFallback, Summarizing, Completed]
        );
        let last = sink.transitions("doc").pop().unwrap();
        assert_eq!(last.fields.summary.as_deref(), Some("short summary"));
        assert_eq!(last.fields.length_mode, Some(LengthMode::Short));
        assert!(last.fields.processed_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected_and_not_recorded() {
        let sink = Arc::new(MemoryStatusSink::new());
        let mut tracker = StatusTracker::new("doc", sink.clone());

        let err = tracker.advance(Summarizing).await.unwrap_err();
        assert!(matches!(
            err,
            DocsumError::InvalidTransition {
                from: Uploaded,
                to: Summarizing,
                ..
            }
        ));
        assert_eq!(tracker.current(), Uploaded);
        assert!(sink.statuses("doc").is_empty());
    }

    #[tokio::test]
    async fn test_failure_records_stage_and_class() {
        let sink = Arc::new(MemoryStatusSink::new());
        let mut tracker = StatusTracker::new("doc", sink.clone());

        tracker.advance(Extracting).await.unwrap();
        tracker
            .fail(&DocsumError::OcrTimeout { budget_secs: 300 })
            .await
            .unwrap();

        let failed = sink.transitions("doc").pop().unwrap();
        assert_eq!(failed.status, Failed);
        let error = failed.fields.error.unwrap();
        assert_eq!(error.class, "OCRTimeout");
        assert_eq!(error.stage, Extracting);

        // absorbing
        assert!(tracker.advance(Summarizing).await.is_err());
        assert!(tracker.fail(&DocsumError::Cancelled).await.is_err());
    }

    struct FinishedSink;

    #[async_trait]
    impl StatusSink for FinishedSink {
        async fn record_transition(
            &self,
            document_id: &str,
            status: DocumentStatus,
            _fields: StatusFields,
        ) -> DocsumResult<()> {
            Err(DocsumError::InvalidTransition {
                document_id: document_id.to_string(),
                from: Completed,
                to: status,
            })
        }
    }

    #[tokio::test]
    async fn test_sink_refusal_stops_the_run() {
        let mut tracker = StatusTracker::new("doc", Arc::new(FinishedSink));
        let err = tracker.advance(Extracting).await.unwrap_err();
        assert!(matches!(
            err,
            DocsumError::InvalidTransition {
                from: Completed,
                to: Extracting,
                ..
            }
        ));
        assert_eq!(tracker.current(), Uploaded);
    }

    #[tokio::test]
    async fn test_sink_errors_do_not_abort() {
        let mut tracker = StatusTracker::new("doc", Arc::new(BrokenSink));
        tracker.advance(Extracting).await.unwrap();
        assert_eq!(tracker.current(), Extracting);
    }
}
