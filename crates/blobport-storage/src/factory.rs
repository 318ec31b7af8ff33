//! Sink construction from CLI-level inputs.

use std::sync::Arc;

use blobport_core::StorageTarget;

use crate::{BlobSink, LocalSink, S3Sink, SinkError, SinkResult};

/// Create the sink for a target. `destination` is the output directory for
/// the filesystem target and the bucket name for S3. `unique_id` is required
/// for S3 only; the caller fetches it from the settings collection.
pub async fn create_sink(
    target: StorageTarget,
    destination: &str,
    unique_id: Option<String>,
) -> SinkResult<Arc<dyn BlobSink>> {
    match target {
        StorageTarget::FileSystem => Ok(Arc::new(LocalSink::new(destination).await?)),
        StorageTarget::AmazonS3 => {
            let unique_id = unique_id.ok_or_else(|| {
                SinkError::ConfigError(
                    "the uniqueID setting is required for the AmazonS3 target".to_string(),
                )
            })?;
            Ok(Arc::new(S3Sink::new(destination.to_string(), unique_id)?))
        }
    }
}
