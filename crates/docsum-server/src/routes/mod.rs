//! Route definitions for the REST API.

mod documents;
mod health;
mod summarize;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Documents
        .route(
            "/documents",
            post(documents::upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/documents/*id", get(documents::get_document))
        // Summarization
        .route("/summarize", post(summarize::summarize_document))
        // Attach state
        .with_state(state)
}

pub use documents::*;
pub use health::*;
pub use summarize::*;
