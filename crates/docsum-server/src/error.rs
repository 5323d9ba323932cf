//! Error handling for the REST API server.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docsum_core::{DocsumError, ErrorCode};
use serde::Serialize;
use std::fmt;
use tracing::error;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BadRequest", message)
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UnsupportedFormat",
            message,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalError", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, code = %self.code, message = %self.message, "Request failed");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                suggestion: self.suggestion,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

/// HTTP status for each failure class.
fn status_for(err: &DocsumError) -> StatusCode {
    match err {
        DocsumError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
        DocsumError::ExtractionFailed { code, .. } if *code == ErrorCode::ExtUnsupportedFormat => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        DocsumError::ExtractionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DocsumError::InputTooShort { .. } => StatusCode::BAD_REQUEST,
        DocsumError::OcrTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        DocsumError::SummarizationFailed { .. } => StatusCode::BAD_GATEWAY,
        DocsumError::InvalidTransition { .. } => StatusCode::CONFLICT,
        DocsumError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        DocsumError::Storage { .. }
        | DocsumError::Configuration(_)
        | DocsumError::Io(_)
        | DocsumError::Serialization(_)
        | DocsumError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Convert from docsum-core errors
impl From<DocsumError> for ApiError {
    fn from(err: DocsumError) -> Self {
        let status = status_for(&err);
        let mut api = ApiError::new(status, err.class_name(), err.to_string());
        if let Some(suggestion) = err.suggestion() {
            api = api.with_suggestion(suggestion);
        }
        api
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::new(err.status(), "BadRequest", err.body_text())
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
