//! Core types for content extraction.

use serde::{Deserialize, Serialize};

/// Strategy that produced an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtractionStrategy {
    /// Format-specific parser, no optical recognition.
    #[serde(rename = "direct")]
    Direct,
    /// Single-image OCR call.
    #[serde(rename = "ocr-sync")]
    OcrSync,
    /// Batch OCR job with sharded output.
    #[serde(rename = "ocr-async")]
    OcrAsync,
}

impl ExtractionStrategy {
    /// Stable name used in logs and status records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::Direct => "direct",
            ExtractionStrategy::OcrSync => "ocr-sync",
            ExtractionStrategy::OcrAsync => "ocr-async",
        }
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single extraction strategy.
///
/// `success == false` means the strategy itself could not run (for example
/// both OCR calls failed). An empty text with `success == true` means the
/// strategy ran but found nothing, and the next strategy should be tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted text (possibly empty).
    pub text: String,
    /// Strategy that produced the text.
    pub strategy: ExtractionStrategy,
    /// Whether the strategy completed.
    pub success: bool,
}

impl ExtractionResult {
    /// Successful result carrying text.
    pub fn new(text: impl Into<String>, strategy: ExtractionStrategy) -> Self {
        Self {
            text: text.into(),
            strategy,
            success: true,
        }
    }

    /// Successful result with no text; signals the caller to fall back.
    pub fn empty(strategy: ExtractionStrategy) -> Self {
        Self::new(String::new(), strategy)
    }

    /// Result for a strategy that could not complete.
    pub fn failed(strategy: ExtractionStrategy) -> Self {
        Self {
            text: String::new(),
            strategy,
            success: false,
        }
    }

    /// Check if extraction produced meaningful content.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Number of whitespace-delimited tokens in the text.
    pub fn token_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_only_is_empty() {
        let result = ExtractionResult::new(" \n\t ", ExtractionStrategy::Direct);
        assert!(result.is_empty());
        assert!(result.success);
    }

    #[test]
    fn test_failed_is_not_success() {
        let result = ExtractionResult::failed(ExtractionStrategy::OcrSync);
        assert!(!result.success);
        assert!(result.is_empty());
    }

    #[test]
    fn test_strategy_serializes_with_dashes() {
        let json = serde_json::to_string(&ExtractionStrategy::OcrAsync).unwrap();
        assert_eq!(json, "\"ocr-async\"");
    }
}
