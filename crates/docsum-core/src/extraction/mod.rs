//! Extraction orchestration: direct parse first, OCR when that yields nothing.

mod orchestrator;

pub use orchestrator::ExtractionOrchestrator;
