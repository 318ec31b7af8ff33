//! Sink abstraction trait.

use async_trait::async_trait;
use blobport_core::{StorageTarget, UploadDoc};
use thiserror::Error;

/// Sink operation errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("upload {id} is missing the {field} field")]
    IncompleteRecord { id: String, field: &'static str },

    #[error("sink configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination capability for migrated blobs.
///
/// `put` persists the payload under a sink-defined location and returns the
/// location key the migration log records. A failed put is an error value;
/// the pipeline worker converts it into a per-record failure, so one bad
/// record never aborts a batch. Implementations must be safe to call from
/// many workers at once.
#[async_trait]
pub trait BlobSink: Send + Sync {
    async fn put(&self, filename: &str, data: Vec<u8>, upload: &UploadDoc)
        -> SinkResult<String>;

    /// Which CLI target this sink serves.
    fn target(&self) -> StorageTarget;
}
