//! Document record and lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::LengthMode;

/// Processing state of a document.
///
/// Runs move forward along `uploaded -> extracting -> [ocr_fallback] ->
/// summarizing -> completed`. `failed` is reachable from every
/// non-terminal state and is absorbing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    Extracting,
    OcrFallback,
    Summarizing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }

    /// Whether moving from `self` to `next` respects the lifecycle.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;

        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Uploaded, Extracting)
                | (Extracting, OcrFallback)
                | (Extracting, Summarizing)
                | (OcrFallback, Summarizing)
                | (Summarizing, Completed)
        )
    }
}

/// Failure details stored with a failed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    /// Short class name, e.g. `OCRTimeout`.
    pub class: String,
    /// State the run was in when it failed.
    pub stage: DocumentStatus,
    pub detail: String,
}

/// An uploaded document and its processing outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Identifier; the storage locator doubles as the id.
    pub id: String,
    pub locator: String,
    pub filename: String,
    /// Normalized extension from the classifier.
    pub extension: String,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_mode: Option<LengthMode>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
}

impl Document {
    /// New record in the `uploaded` state.
    pub fn uploaded(
        locator: impl Into<String>,
        filename: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        let locator = locator.into();
        Self {
            id: locator.clone(),
            locator,
            filename: filename.into(),
            extension: extension.into(),
            status: DocumentStatus::Uploaded,
            extracted_text: None,
            summary: None,
            length_mode: None,
            created_at: Utc::now(),
            processed_at: None,
            last_error: None,
        }
    }
}
