//! Document upload and status endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use docsum_core::{status::StatusHistoryRecord, DocsumError, Document, DocumentStatus};
use docsum_extractors::classify;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// Prefix for uploaded object names.
const UPLOAD_PREFIX: &str = "raw_documents";

/// Response for an accepted upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub filename: String,
    pub extension: String,
    pub status: DocumentStatus,
}

/// Strip any client-supplied directories from an upload filename.
fn base_filename(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim()
}

/// `raw_documents/<nanos>_<hex>_<filename>`; unique per upload.
fn object_name(filename: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}/{}_{}_{}", UPLOAD_PREFIX, nanos, &hex[..8], filename)
}

/// Upload a document.
/// POST /documents
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(base_filename)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("The 'file' field has no filename"))?;

        let class = classify(&filename);
        if !class.kind.is_supported() {
            return Err(ApiError::unsupported_media_type(format!(
                "Unsupported file type: {}",
                class.extension
            ))
            .with_suggestion("Supported formats are txt, docx, pdf and common image types"));
        }

        let content_type = field.content_type().map(str::to_string);
        let content = field.bytes().await?;
        if content.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }

        let locator = format!("{}{}", state.locator_prefix(), object_name(&filename));
        state
            .objects()
            .put(&locator, &content, content_type.as_deref())
            .await
            .map_err(DocsumError::from)?;

        let document = Document::uploaded(&locator, &filename, &class.extension);
        state.documents().create(&document)?;

        info!(document_id = %document.id, bytes = content.len(), extension = %class.extension, "Document uploaded");

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                document_id: document.id,
                filename: document.filename,
                extension: document.extension,
                status: document.status,
            }),
        ));
    }

    Err(ApiError::bad_request(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}

/// Query parameters for a status lookup.
#[derive(Debug, Deserialize)]
pub struct GetDocumentQuery {
    /// Include the status transition log.
    #[serde(default)]
    pub history: bool,
}

/// Response for a status lookup.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<StatusHistoryRecord>>,
}

/// Get a document's status record.
/// GET /documents/*id
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<GetDocumentQuery>,
) -> ApiResult<Json<DocumentResponse>> {
    let document = state
        .documents()
        .get(&id)?
        .ok_or_else(|| DocsumError::not_found(&id))?;

    let history = if query.history {
        Some(state.documents().history(&id)?)
    } else {
        None
    };

    Ok(Json(DocumentResponse { document, history }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsum_extractors::extension_for_locator;

    #[test]
    fn test_base_filename_drops_directories() {
        assert_eq!(base_filename("report.pdf"), "report.pdf");
        assert_eq!(base_filename("../../etc/notes.txt"), "notes.txt");
        assert_eq!(base_filename("C:\\Users\\me\\scan.png"), "scan.png");
    }

    #[test]
    fn test_object_name_round_trips_extension() {
        let name = object_name("quarterly_report.PDF");
        assert!(name.starts_with("raw_documents/"));
        assert!(name.ends_with("_quarterly_report.PDF"));
        assert_eq!(extension_for_locator(&name), "pdf");
    }
}
