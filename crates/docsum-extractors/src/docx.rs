//! DOCX content extraction using docx-rs.
//!
//! Extracts body paragraph text in document order. Tables, headers and
//! footers are not read.

use async_trait::async_trait;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use tracing::{debug, warn};

use crate::classify::FormatKind;
use crate::types::{ExtractionResult, ExtractionStrategy};
use crate::DirectExtractor;

/// DOCX content extractor using docx-rs library.
///
/// Wraps synchronous docx-rs calls in spawn_blocking. A document that
/// fails to parse yields an empty result instead of an error, so the
/// orchestrator can fall back to OCR.
#[derive(Debug, Clone, Default)]
pub struct DocxExtractor;

impl DocxExtractor {
    /// Create new DOCX extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract body paragraphs synchronously (called within spawn_blocking).
    fn extract_sync(content: Vec<u8>) -> Result<Vec<String>, String> {
        let docx = docx_rs::read_docx(&content).map_err(|e| e.to_string())?;

        let paragraphs = docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => Some(Self::paragraph_text(p)),
                _ => None,
            })
            .collect();

        Ok(paragraphs)
    }

    /// Extract text from a paragraph.
    fn paragraph_text(p: &docx_rs::Paragraph) -> String {
        let mut text = String::new();

        for child in &p.children {
            match child {
                ParagraphChild::Run(r) => Self::push_run(&mut text, r),
                ParagraphChild::Hyperlink(h) => {
                    for child in &h.children {
                        if let ParagraphChild::Run(r) = child {
                            Self::push_run(&mut text, r);
                        }
                    }
                }
                _ => {}
            }
        }

        text
    }

    fn push_run(text: &mut String, run: &docx_rs::Run) {
        for run_child in &run.children {
            match run_child {
                RunChild::Text(t) => text.push_str(&t.text),
                RunChild::Tab(_) => text.push('\t'),
                _ => {}
            }
        }
    }

    /// Join non-blank paragraphs with a single newline.
    pub(crate) fn join_paragraphs(paragraphs: Vec<String>) -> String {
        paragraphs
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl DirectExtractor for DocxExtractor {
    async fn extract(&self, content: &[u8]) -> ExtractionResult {
        let content = content.to_vec();
        let content_len = content.len();

        let paragraphs = match tokio::task::spawn_blocking(move || Self::extract_sync(content)).await {
            Ok(Ok(paragraphs)) => paragraphs,
            Ok(Err(e)) => {
                warn!(size = content_len, error = %e, "DOCX structure is corrupt");
                return ExtractionResult::empty(ExtractionStrategy::Direct);
            }
            Err(e) => {
                warn!(error = %e, "DOCX extraction task failed");
                return ExtractionResult::empty(ExtractionStrategy::Direct);
            }
        };

        let text = Self::join_paragraphs(paragraphs);
        debug!(chars = text.len(), "Extracted DOCX text");

        ExtractionResult::new(text, ExtractionStrategy::Direct)
    }

    fn kind(&self) -> FormatKind {
        FormatKind::Docx
    }

    fn name(&self) -> &str {
        "docx-rs"
    }
}
