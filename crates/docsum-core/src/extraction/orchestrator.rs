//! Extraction orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use docsum_extractors::{
    DirectExtractor, ExtractionResult, ExtractorFactory, FormatKind, ObjectStore, OcrEngine,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DocsumError, DocsumResult, ErrorCode};
use crate::status::StatusTracker;
use crate::types::DocumentStatus;

/// Sequences direct extraction and the OCR fallback for one document.
///
/// Workflow:
/// 1. Record `extracting` and confirm the object exists
/// 2. Run the direct extractor for the format, if there is one
/// 3. On empty text, record `ocr_fallback` and run OCR (batch for PDFs,
///    single-image for everything else)
/// 4. Fail rather than return empty text
pub struct ExtractionOrchestrator {
    store: Arc<dyn ObjectStore>,
    ocr: Arc<OcrEngine>,
    extractors: HashMap<FormatKind, Arc<dyn DirectExtractor>>,
}

impl ExtractionOrchestrator {
    /// Create an orchestrator using the compiled-in direct extractors.
    pub fn new(store: Arc<dyn ObjectStore>, ocr: Arc<OcrEngine>) -> Self {
        Self {
            store,
            ocr,
            extractors: HashMap::new(),
        }
    }

    /// Replace the direct extractor for the extractor's format.
    pub fn with_extractor(mut self, extractor: Arc<dyn DirectExtractor>) -> Self {
        self.extractors.insert(extractor.kind(), extractor);
        self
    }

    fn extractor_for(&self, kind: FormatKind) -> Option<Arc<dyn DirectExtractor>> {
        self.extractors
            .get(&kind)
            .cloned()
            .or_else(|| ExtractorFactory::for_kind(kind))
    }

    /// Extract text for the object at `locator`.
    ///
    /// Never returns empty text as success.
    pub async fn extract(
        &self,
        locator: &str,
        extension: &str,
        tracker: &mut StatusTracker,
        cancel: &CancellationToken,
    ) -> DocsumResult<ExtractionResult> {
        tracker.advance(DocumentStatus::Extracting).await?;
        if cancel.is_cancelled() {
            return Err(DocsumError::Cancelled);
        }

        if !self.store.exists(locator).await? {
            return Err(DocsumError::not_found(locator));
        }

        let kind = FormatKind::from_extension(extension);
        if !kind.is_supported() {
            return Err(DocsumError::unsupported_format(extension));
        }

        let content = self.store.read(locator).await?;
        debug!(locator = %locator, ?kind, bytes = content.len(), "Loaded document");

        if let Some(extractor) = self.extractor_for(kind) {
            let result = extractor.extract(&content).await;
            if !result.is_empty() {
                info!(
                    locator = %locator,
                    extractor = extractor.name(),
                    tokens = result.token_count(),
                    "Direct extraction succeeded"
                );
                return Ok(result);
            }
            warn!(locator = %locator, extractor = extractor.name(), "Direct extraction yielded no text, falling back to OCR");
        }

        tracker.advance(DocumentStatus::OcrFallback).await?;
        let result = match kind {
            FormatKind::Pdf => self.ocr.detect_async(locator, cancel).await?,
            _ => self.ocr.detect_sync(&content).await,
        };

        if !result.success {
            return Err(DocsumError::ExtractionFailed {
                message: format!("{} OCR could not process the document", result.strategy),
                code: ErrorCode::ExtOcrFailed,
                source: None,
            });
        }
        if result.is_empty() {
            return Err(DocsumError::no_text(format!(
                "no text found by direct extraction or {} OCR",
                result.strategy
            )));
        }

        info!(
            locator = %locator,
            strategy = %result.strategy,
            tokens = result.token_count(),
            "OCR extraction succeeded"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MemoryStatusSink;
    use async_trait::async_trait;
    use docsum_extractors::{
        DetectionMode, ExtractionStrategy, LocalObjectStore, OcrEngineConfig, OcrError, OcrResult,
        TextAnnotation, TextDetector,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Detector returning a fixed annotation and counting calls.
    struct FixedDetector {
        text: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextDetector for FixedDetector {
        async fn detect(&self, _image: &[u8], _mode: DetectionMode) -> OcrResult<TextAnnotation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.text {
                Some(text) => Ok(TextAnnotation::full(text)),
                None => Err(OcrError::Remote("unavailable".into())),
            }
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<LocalObjectStore>,
        detector: Arc<FixedDetector>,
        orchestrator: ExtractionOrchestrator,
        sink: Arc<MemoryStatusSink>,
    }

    fn fixture(ocr_text: Option<&'static str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalObjectStore::new(dir.path()));
        let detector = Arc::new(FixedDetector {
            text: ocr_text,
            calls: AtomicUsize::new(0),
        });
        let engine = OcrEngine::new(detector.clone(), store.clone(), OcrEngineConfig::default());
        let orchestrator = ExtractionOrchestrator::new(store.clone(), Arc::new(engine));
        Fixture {
            _dir: dir,
            store,
            detector,
            orchestrator,
            sink: Arc::new(MemoryStatusSink::new()),
        }
    }

    impl Fixture {
        fn tracker(&self, id: &str) -> StatusTracker {
            StatusTracker::new(id, self.sink.clone())
        }
    }

    #[tokio::test]
    async fn test_text_uses_direct_path() {
        let fx = fixture(Some("unused"));
        fx.store.put("docs/a.txt", b"plain words here", None).await.unwrap();

        let mut tracker = fx.tracker("docs/a.txt");
        let result = fx
            .orchestrator
            .extract("docs/a.txt", "txt", &mut tracker, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.strategy, ExtractionStrategy::Direct);
        assert_eq!(result.text, "plain words here");
        assert_eq!(fx.detector.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.sink.statuses("docs/a.txt"), vec![DocumentStatus::Extracting]);
    }

    #[tokio::test]
    async fn test_missing_document_fails_before_extraction() {
        let fx = fixture(Some("unused"));
        let mut tracker = fx.tracker("docs/missing.pdf");

        let err = fx
            .orchestrator
            .extract("docs/missing.pdf", "pdf", &mut tracker, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DocsumError::DocumentNotFound { .. }));
        assert_eq!(fx.detector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_goes_straight_to_sync_ocr() {
        let fx = fixture(Some("STOP SIGN"));
        fx.store.put("docs/sign.png", b"\x89PNG", None).await.unwrap();

        let mut tracker = fx.tracker("docs/sign.png");
        let result = fx
            .orchestrator
            .extract("docs/sign.png", "png", &mut tracker, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.strategy, ExtractionStrategy::OcrSync);
        assert_eq!(result.text, "STOP SIGN");
        assert_eq!(
            fx.sink.statuses("docs/sign.png"),
            vec![DocumentStatus::Extracting, DocumentStatus::OcrFallback]
        );
    }

    #[tokio::test]
    async fn test_empty_text_file_falls_back_to_sync_ocr() {
        let fx = fixture(Some("recovered"));
        fx.store.put("docs/blank.txt", b"   \n", None).await.unwrap();

        let mut tracker = fx.tracker("docs/blank.txt");
        let result = fx
            .orchestrator
            .extract("docs/blank.txt", "txt", &mut tracker, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.strategy, ExtractionStrategy::OcrSync);
    }

    #[tokio::test]
    async fn test_failed_ocr_is_extraction_failure() {
        let fx = fixture(None);
        fx.store.put("docs/sign.jpg", b"jpeg", None).await.unwrap();

        let mut tracker = fx.tracker("docs/sign.jpg");
        let err = fx
            .orchestrator
            .extract("docs/sign.jpg", "jpg", &mut tracker, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ExtOcrFailed);
        assert_eq!(fx.detector.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let fx = fixture(Some("unused"));
        fx.store.put("docs/a.xyz", b"data", None).await.unwrap();

        let mut tracker = fx.tracker("docs/a.xyz");
        let err = fx
            .orchestrator
            .extract("docs/a.xyz", "xyz", &mut tracker, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ExtUnsupportedFormat);
    }

    #[tokio::test]
    async fn test_pdf_without_batch_capability_fails() {
        let fx = fixture(Some("unused"));
        fx.store.put("docs/scan.pdf", b"not a pdf", None).await.unwrap();

        let mut tracker = fx.tracker("docs/scan.pdf");
        let err = fx
            .orchestrator
            .extract("docs/scan.pdf", "pdf", &mut tracker, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.class_name(), "ExtractionFailed");
        // batch path only, single-image OCR is never used for PDFs
        assert_eq!(fx.detector.calls.load(Ordering::SeqCst), 0);
    }
}
