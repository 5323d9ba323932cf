//! Summarization endpoint.

use axum::{extract::State, Json};
use docsum_core::{DocumentStatus, LengthMode};
use docsum_extractors::{extension_for_locator, ExtractionStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for summarizing a stored document.
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub document_id: String,
    /// `short`, `medium` or `long`; anything else means medium.
    #[serde(default)]
    pub length_mode: Option<String>,
}

/// Response for a completed summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub document_id: String,
    pub summary: String,
    pub status: DocumentStatus,
    pub strategy: ExtractionStrategy,
    pub length_mode: LengthMode,
}

/// Extract and summarize an uploaded document.
/// POST /summarize
pub async fn summarize_document(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> ApiResult<Json<SummarizeResponse>> {
    let document_id = request.document_id.trim();
    if document_id.is_empty() {
        return Err(ApiError::bad_request("document_id must not be empty"));
    }

    let length_mode = request
        .length_mode
        .as_deref()
        .map(LengthMode::from_selector)
        .unwrap_or_default();

    // Objects placed outside the upload route have no record; classify the locator.
    let extension = match state.documents().get(document_id)? {
        Some(document) => document.extension,
        None => extension_for_locator(document_id),
    };

    let outcome = state
        .pipeline()
        .extract_and_summarize(document_id, &extension, length_mode)
        .await?;

    Ok(Json(SummarizeResponse {
        document_id: outcome.document_id,
        summary: outcome.summary,
        status: outcome.final_status,
        strategy: outcome.strategy,
        length_mode: outcome.length_mode,
    }))
}
