//! Server state management.

use std::sync::Arc;

use docsum_core::{DocsumConfig, DocsumResult, DocumentPipeline, SqliteDocumentStore};
use docsum_extractors::ObjectStore;

use crate::factory::create_components;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    /// Upload target; also read by the pipeline.
    pub objects: Arc<dyn ObjectStore>,
    /// Status records for uploaded documents.
    pub documents: Arc<SqliteDocumentStore>,
    pub pipeline: DocumentPipeline,
    /// Prepended to `raw_documents/...` object names, e.g. `gs://bucket/`.
    pub locator_prefix: String,
}

impl AppState {
    /// Assemble state from already-built components.
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        documents: Arc<SqliteDocumentStore>,
        pipeline: DocumentPipeline,
        locator_prefix: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                objects,
                documents,
                pipeline,
                locator_prefix: locator_prefix.into(),
            }),
        }
    }

    /// Build every component named in `config`.
    pub fn from_config(config: &DocsumConfig) -> DocsumResult<Self> {
        create_components(config)
    }

    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.objects
    }

    pub fn documents(&self) -> &SqliteDocumentStore {
        &self.inner.documents
    }

    pub fn pipeline(&self) -> &DocumentPipeline {
        &self.inner.pipeline
    }

    pub fn locator_prefix(&self) -> &str {
        &self.inner.locator_prefix
    }
}
