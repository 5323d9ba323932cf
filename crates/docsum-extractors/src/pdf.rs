//! Digital PDF text extraction using pdf-extract.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::classify::FormatKind;
use crate::types::{ExtractionResult, ExtractionStrategy};
use crate::DirectExtractor;

/// PDF content extractor using pdf-extract library.
///
/// Extracts text page by page, wrapping synchronous pdf-extract calls in
/// spawn_blocking to avoid blocking the async runtime. A PDF that cannot
/// be opened yields an empty result so the caller falls back to OCR.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create new PDF extractor.
    pub fn new() -> Self {
        Self
    }

    /// Join page texts in page order. Pages without text add nothing.
    pub(crate) fn join_pages(pages: Vec<String>) -> String {
        pages
            .into_iter()
            .filter(|page| !page.trim().is_empty())
            .collect::<Vec<_>>()
            .concat()
    }

    fn extract_sync(content: Vec<u8>) -> Result<Vec<String>, String> {
        pdf_extract::extract_text_from_mem_by_pages(&content).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl DirectExtractor for PdfExtractor {
    async fn extract(&self, content: &[u8]) -> ExtractionResult {
        let content = content.to_vec();
        let content_len = content.len();

        let pages = match tokio::task::spawn_blocking(move || Self::extract_sync(content)).await {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                warn!(size = content_len, error = %e, "PDF parser could not open document");
                return ExtractionResult::empty(ExtractionStrategy::Direct);
            }
            Err(e) => {
                warn!(error = %e, "PDF extraction task failed");
                return ExtractionResult::empty(ExtractionStrategy::Direct);
            }
        };

        let page_count = pages.len();
        let text = Self::join_pages(pages);
        debug!(page_count, chars = text.len(), "Extracted digital PDF text");

        ExtractionResult::new(text, ExtractionStrategy::Direct)
    }

    fn kind(&self) -> FormatKind {
        FormatKind::Pdf
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}
