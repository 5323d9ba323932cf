//! Error types for docsum operations.
//!
//! Every pipeline failure maps onto one variant of [`DocsumError`], which
//! carries a structured [`ErrorCode`] and a short class name recorded in
//! status records and returned by the HTTP surface.

use docsum_extractors::{OcrError, StoreError};
use thiserror::Error;

use crate::types::DocumentStatus;

/// Result type alias for docsum operations.
pub type DocsumResult<T> = Result<T, DocsumError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all docsum operations.
#[derive(Error, Debug)]
pub enum DocsumError {
    /// No stored object at the document's locator.
    #[error("Document not found: {locator}")]
    DocumentNotFound { locator: String },

    /// No strategy produced usable text.
    #[error("Extraction failed: {message}")]
    ExtractionFailed {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Batch OCR did not finish within its time budget.
    #[error("OCR job exceeded its {budget_secs}s time budget")]
    OcrTimeout { budget_secs: u64 },

    /// Extracted text is too short to summarize.
    #[error("Input too short: {tokens} tokens, at least {minimum} required")]
    InputTooShort { tokens: usize, minimum: usize },

    /// Remote summarization failed or returned nothing.
    #[error("Summarization failed: {detail}")]
    SummarizationFailed {
        detail: String,
        code: ErrorCode,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Caller cancelled the run.
    #[error("Operation cancelled")]
    Cancelled,

    /// Object store or status database failed.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Status transition outside the document lifecycle.
    #[error("Invalid status transition for {document_id}: {from} -> {to}")]
    InvalidTransition {
        document_id: String,
        from: DocumentStatus,
        to: DocumentStatus,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Documents (DOC_xxx)
    DocNotFound,

    // Extraction (EXT_xxx)
    ExtUnsupportedFormat,
    ExtNoText,
    ExtOcrFailed,
    ExtInvalidOcrOutput,

    // OCR (OCR_xxx)
    OcrTimeout,

    // Validation (VAL_xxx)
    ValInputTooShort,
    ValInvalidTransition,

    // LLM (LLM_xxx)
    LlmGenerationFailed,
    LlmEmptyResponse,

    // Storage (STO_xxx)
    StoObjectStoreFailed,
    StoDatabaseFailed,

    // Configuration (CFG_xxx)
    CfgInvalid,

    // Cancellation
    Cancelled,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DocNotFound => "DOC_001",
            ErrorCode::ExtUnsupportedFormat => "EXT_001",
            ErrorCode::ExtNoText => "EXT_002",
            ErrorCode::ExtOcrFailed => "EXT_003",
            ErrorCode::ExtInvalidOcrOutput => "EXT_004",
            ErrorCode::OcrTimeout => "OCR_001",
            ErrorCode::ValInputTooShort => "VAL_001",
            ErrorCode::ValInvalidTransition => "VAL_002",
            ErrorCode::LlmGenerationFailed => "LLM_001",
            ErrorCode::LlmEmptyResponse => "LLM_002",
            ErrorCode::StoObjectStoreFailed => "STO_001",
            ErrorCode::StoDatabaseFailed => "STO_002",
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::Cancelled => "CAN_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl DocsumError {
    /// Create a document-not-found error.
    pub fn not_found(locator: impl Into<String>) -> Self {
        Self::DocumentNotFound {
            locator: locator.into(),
        }
    }

    /// Create an extraction error for a format with no extraction route.
    pub fn unsupported_format(extension: &str) -> Self {
        Self::ExtractionFailed {
            message: format!("unsupported format '{}'", extension),
            code: ErrorCode::ExtUnsupportedFormat,
            source: None,
        }
    }

    /// Create an extraction error for a run that produced no text.
    pub fn no_text(message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            message: message.into(),
            code: ErrorCode::ExtNoText,
            source: None,
        }
    }

    /// Create a summarization error.
    pub fn summarization(detail: impl Into<String>) -> Self {
        Self::SummarizationFailed {
            detail: detail.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoObjectStoreFailed,
            source: None,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoDatabaseFailed,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DocumentNotFound { .. } => ErrorCode::DocNotFound,
            Self::ExtractionFailed { code, .. } => *code,
            Self::OcrTimeout { .. } => ErrorCode::OcrTimeout,
            Self::InputTooShort { .. } => ErrorCode::ValInputTooShort,
            Self::SummarizationFailed { code, .. } => *code,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Storage { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            Self::InvalidTransition { .. } => ErrorCode::ValInvalidTransition,
            _ => ErrorCode::Internal,
        }
    }

    /// Short machine-readable class name.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::DocumentNotFound { .. } => "DocumentNotFound",
            Self::ExtractionFailed { .. } => "ExtractionFailed",
            Self::OcrTimeout { .. } => "OCRTimeout",
            Self::InputTooShort { .. } => "InputTooShort",
            Self::SummarizationFailed { .. } => "SummarizationFailed",
            Self::Cancelled => "Cancelled",
            Self::Storage { .. } => "StorageError",
            Self::Configuration(_) => "ConfigurationError",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::Io(_) => "IOError",
            Self::Serialization(_) => "SerializationError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::DocumentNotFound { .. } => Some("Please check the document ID and upload the file first"),
            Self::ExtractionFailed {
                code: ErrorCode::ExtUnsupportedFormat,
                ..
            } => Some("Supported formats are txt, docx, pdf and common image types"),
            Self::InputTooShort { .. } => Some("Provide a longer document"),
            Self::OcrTimeout { .. } => Some("Retry later or raise the OCR timeout"),
            Self::SummarizationFailed { .. } => Some("Please check your LLM provider configuration"),
            _ => None,
        }
    }
}

impl From<StoreError> for DocsumError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(locator) => Self::DocumentNotFound { locator },
            other => Self::Storage {
                message: other.to_string(),
                code: ErrorCode::StoObjectStoreFailed,
                source: Some(Box::new(other)),
            },
        }
    }
}

impl From<OcrError> for DocsumError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::Timeout { budget } => Self::OcrTimeout {
                budget_secs: budget.as_secs(),
            },
            OcrError::Cancelled => Self::Cancelled,
            OcrError::NoOutput { .. } => Self::ExtractionFailed {
                message: err.to_string(),
                code: ErrorCode::ExtNoText,
                source: Some(Box::new(err)),
            },
            OcrError::InvalidShard { .. } => Self::ExtractionFailed {
                message: err.to_string(),
                code: ErrorCode::ExtInvalidOcrOutput,
                source: Some(Box::new(err)),
            },
            OcrError::TaskJoin(e) => Self::Internal(e.to_string()),
            other => Self::ExtractionFailed {
                message: other.to_string(),
                code: ErrorCode::ExtOcrFailed,
                source: Some(Box::new(other)),
            },
        }
    }
}

impl From<rusqlite::Error> for DocsumError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
            code: ErrorCode::StoDatabaseFailed,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_class_names() {
        assert_eq!(DocsumError::not_found("x").class_name(), "DocumentNotFound");
        assert_eq!(DocsumError::no_text("empty").class_name(), "ExtractionFailed");
        assert_eq!(
            DocsumError::OcrTimeout { budget_secs: 300 }.class_name(),
            "OCRTimeout"
        );
        assert_eq!(
            DocsumError::InputTooShort { tokens: 3, minimum: 20 }.class_name(),
            "InputTooShort"
        );
        assert_eq!(
            DocsumError::summarization("quota").class_name(),
            "SummarizationFailed"
        );
    }

    #[test]
    fn test_ocr_errors_convert() {
        let timeout: DocsumError = OcrError::Timeout {
            budget: Duration::from_secs(300),
        }
        .into();
        assert!(matches!(timeout, DocsumError::OcrTimeout { budget_secs: 300 }));

        let none: DocsumError = OcrError::NoOutput {
            prefix: "out/ocr-results-1/".into(),
        }
        .into();
        assert_eq!(none.code(), ErrorCode::ExtNoText);

        let remote: DocsumError = OcrError::Remote("bad pdf".into()).into();
        assert_eq!(remote.class_name(), "ExtractionFailed");
        assert!(remote.to_string().contains("bad pdf"));

        let cancelled: DocsumError = OcrError::Cancelled.into();
        assert!(matches!(cancelled, DocsumError::Cancelled));
    }

    #[test]
    fn test_store_not_found_is_document_not_found() {
        let err: DocsumError = StoreError::NotFound("raw_documents/x".into()).into();
        assert!(matches!(err, DocsumError::DocumentNotFound { .. }));
        assert_eq!(err.code().as_str(), "DOC_001");
    }

    #[test]
    fn test_unsupported_has_suggestion() {
        let err = DocsumError::unsupported_format("xyz");
        assert_eq!(err.code(), ErrorCode::ExtUnsupportedFormat);
        assert!(err.suggestion().is_some());
    }
}
