//! docsum-server - REST API server for docsum.
//!
//! Thin HTTP surface over the document pipeline: upload, summarize, status
//! lookup and health. All extraction and summarization logic lives in
//! `docsum-core`.
//!
//! # Example
//!
//! ```ignore
//! use docsum_core::DocsumConfig;
//! use docsum_server::{create_server, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::from_config(&DocsumConfig::from_env())?;
//!     let app = create_server(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod factory;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use factory::create_components;
pub use state::AppState;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    // Layers are applied innermost-first; each `Router::layer` call boxes the
    // response body, which `CorsLayer` needs (it requires `ResBody: Default`).
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
