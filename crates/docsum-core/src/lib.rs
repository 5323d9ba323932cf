//! docsum-core - Core library for docsum.
//!
//! Sequences text extraction and summarization for uploaded documents:
//! the extraction orchestrator (direct parse, then OCR), the summarization
//! request builder, per-run status tracking, and the SQLite document store.
//!
//! # Example
//!
//! ```ignore
//! use docsum_core::{DocumentPipeline, ExtractionOrchestrator, LengthMode, SummaryRequestBuilder};
//!
//! let orchestrator = ExtractionOrchestrator::new(store, ocr_engine);
//! let summarizer = SummaryRequestBuilder::new(llm);
//! let pipeline = DocumentPipeline::new(orchestrator, summarizer, status_store);
//!
//! let outcome = pipeline
//!     .extract_and_summarize("raw_documents/1700000000_ab12_report.pdf", "pdf", LengthMode::Short)
//!     .await?;
//! println!("{}", outcome.summary);
//! ```

pub mod config;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod status;
pub mod summarize;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{
    DocsumConfig, LlmProvider, LlmProviderConfig, OcrConfig, OcrProvider, StorageBackend,
    StorageConfig, SummarizerConfig,
};
pub use error::{DocsumError, DocsumResult, ErrorCode};
pub use extraction::ExtractionOrchestrator;
pub use pipeline::{DocumentPipeline, PipelineOutcome};
pub use status::{
    MemoryStatusSink, SqliteDocumentStore, StatusFields, StatusSink, StatusTracker,
};
pub use summarize::SummaryRequestBuilder;
pub use traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
pub use types::{
    split_system, Document, DocumentStatus, LastError, LengthMode, LengthProfile, Message,
    MessageRole,
};
