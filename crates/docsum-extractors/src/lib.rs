//! docsum-extractors - Text extraction for uploaded documents.
//!
//! Provides the leaves of the summarization pipeline: filename
//! classification, direct extractors for text/DOCX/PDF, the object-store
//! and OCR capability traits, and the OCR fallback engine that drives
//! single-image and batch OCR.
//!
//! # Features
//!
//! - `pdf` (default) - digital PDF text extraction via pdf-extract
//! - `docx` (default) - DOCX text extraction via docx-rs
//! - `tesseract` - local OCR via Tesseract (requires tesseract installed)
//! - `gcp` - Google Cloud Vision OCR and Cloud Storage object store
//! - `full` - All of the above
//!
//! # Example
//!
//! ```ignore
//! use docsum_extractors::{classify, ExtractorFactory};
//!
//! let class = classify("report.PDF");
//! if let Some(extractor) = ExtractorFactory::for_kind(class.kind) {
//!     let result = extractor.extract(&bytes).await;
//!     if result.is_empty() {
//!         // fall back to OCR
//!     }
//! }
//! ```

mod classify;
mod error;
mod factory;
mod store;
mod text;
mod types;

pub mod ocr;

#[cfg(feature = "pdf")]
mod pdf;

#[cfg(feature = "docx")]
mod docx;

#[cfg(feature = "tesseract")]
pub mod tesseract;

#[cfg(feature = "gcp")]
pub mod gcp;

pub use classify::{classify, extension_for_locator, FormatClass, FormatKind, UNSUPPORTED};
pub use error::{OcrError, OcrResult, StoreError, StoreResult};
pub use factory::ExtractorFactory;
pub use ocr::{
    BatchOcr, DetectionMode, JobHandle, OcrEngine, OcrEngineConfig, OcrJob, ShardOrder,
    TextAnnotation, TextDetector,
};
pub use store::{LocalObjectStore, ObjectStore};
pub use text::PlainTextExtractor;
pub use types::{ExtractionResult, ExtractionStrategy};

#[cfg(feature = "pdf")]
pub use pdf::PdfExtractor;

#[cfg(feature = "docx")]
pub use docx::DocxExtractor;

use async_trait::async_trait;

/// Core trait for direct (non-OCR) extractors.
///
/// Direct extractors never return an error: a format they cannot parse
/// yields an empty, non-failed [`ExtractionResult`], which tells the caller
/// to try the OCR fallback.
#[async_trait]
pub trait DirectExtractor: Send + Sync {
    /// Extract text content from raw file bytes.
    async fn extract(&self, content: &[u8]) -> ExtractionResult;

    /// Format this extractor handles.
    fn kind(&self) -> FormatKind;

    /// Human-readable name for this extractor.
    fn name(&self) -> &str;
}
