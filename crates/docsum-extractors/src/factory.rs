//! Factory for creating direct extractors.

use std::sync::Arc;

use crate::classify::FormatKind;
use crate::text::PlainTextExtractor;
use crate::DirectExtractor;

#[cfg(feature = "pdf")]
use crate::PdfExtractor;

#[cfg(feature = "docx")]
use crate::DocxExtractor;

/// Factory for creating direct extractors.
pub struct ExtractorFactory;

impl ExtractorFactory {
    /// Create a plain text extractor.
    pub fn text() -> Arc<dyn DirectExtractor> {
        Arc::new(PlainTextExtractor::new())
    }

    /// Create a PDF extractor.
    #[cfg(feature = "pdf")]
    pub fn pdf() -> Arc<dyn DirectExtractor> {
        Arc::new(PdfExtractor::new())
    }

    /// Create a DOCX extractor.
    #[cfg(feature = "docx")]
    pub fn docx() -> Arc<dyn DirectExtractor> {
        Arc::new(DocxExtractor::new())
    }

    /// Create the direct extractor for a format, if one is compiled in.
    pub fn for_kind(kind: FormatKind) -> Option<Arc<dyn DirectExtractor>> {
        match kind {
            FormatKind::Text => Some(Self::text()),

            #[cfg(feature = "pdf")]
            FormatKind::Pdf => Some(Self::pdf()),

            #[cfg(feature = "docx")]
            FormatKind::Docx => Some(Self::docx()),

            _ => None,
        }
    }
}
