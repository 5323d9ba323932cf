//! Extraction error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by object-store collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Object does not exist at the locator.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Locator could not be interpreted by this store.
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// Remote storage backend reported an error.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// IO error from a local store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for object-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the OCR fallback engine and its capabilities.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Remote OCR capability signalled an error.
    #[error("OCR remote error: {0}")]
    Remote(String),

    /// Batch job did not finish within its time budget.
    #[error("OCR job exceeded its {}s time budget", .budget.as_secs())]
    Timeout { budget: Duration },

    /// Caller cancelled the extraction while the batch job was running.
    #[error("OCR job wait cancelled")]
    Cancelled,

    /// Job reported success but wrote no shard under its output prefix.
    #[error("No OCR output found under {prefix}")]
    NoOutput { prefix: String },

    /// A result shard could not be parsed.
    #[error("Invalid OCR shard {name}: {reason}")]
    InvalidShard { name: String, reason: String },

    /// Reading shards from the object store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Task join error from spawn_blocking.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Result type for OCR operations.
pub type OcrResult<T> = Result<T, OcrError>;
