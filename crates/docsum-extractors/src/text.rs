//! Plain text extraction.

use async_trait::async_trait;

use crate::classify::FormatKind;
use crate::types::{ExtractionResult, ExtractionStrategy};
use crate::DirectExtractor;

/// Plain text extractor.
///
/// Decodes bytes as UTF-8, replacing invalid sequences with U+FFFD.
/// Never fails.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DirectExtractor for PlainTextExtractor {
    async fn extract(&self, content: &[u8]) -> ExtractionResult {
        let text = String::from_utf8_lossy(content).into_owned();
        ExtractionResult::new(text, ExtractionStrategy::Direct)
    }

    fn kind(&self) -> FormatKind {
        FormatKind::Text
    }

    fn name(&self) -> &str {
        "plain-text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_valid_utf8_is_preserved() {
        let input = "Résumé — naïve café\nsecond line";
        let result = PlainTextExtractor::new().extract(input.as_bytes()).await;
        assert!(result.success);
        assert_eq!(result.text, input);
        assert_eq!(result.strategy, ExtractionStrategy::Direct);
    }

    #[tokio::test]
    async fn test_invalid_bytes_are_replaced() {
        let input = [b'o', b'k', 0xFF, 0xFE, b'!'];
        let result = PlainTextExtractor::new().extract(&input).await;
        assert!(result.success);
        assert_eq!(result.text, "ok\u{FFFD}\u{FFFD}!");
    }

    #[tokio::test]
    async fn test_empty_input_is_empty_success() {
        let result = PlainTextExtractor::new().extract(&[]).await;
        assert!(result.success);
        assert!(result.is_empty());
    }
}
