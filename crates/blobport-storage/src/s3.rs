//! S3 bucket sink.

use async_trait::async_trait;
use blobport_core::{StorageTarget, UploadDoc};
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::traits::{BlobSink, SinkError, SinkResult};

/// Characters percent-encoded in the content-disposition filename.
/// Alphanumerics and the removed punctuation pass through untouched.
const DISPOSITION_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'~')
    .remove(b'@')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'!')
    .remove(b'+')
    .remove(b'=')
    .remove(b':')
    .remove(b';')
    .remove(b',')
    .remove(b'.')
    .remove(b'?')
    .remove(b'/')
    .remove(b'\'')
    .remove(b'_')
    .remove(b'-');

/// Percent-encode a display name for the `Content-Disposition` header.
pub fn encode_disposition_name(name: &str) -> String {
    utf8_percent_encode(name, DISPOSITION_SET).to_string()
}

/// Object key for a migrated upload:
/// `{uniqueId}/Uploads/{roomId}/{userId}/{uploadId}`. The path template is
/// fixed; it must match what the application expects to find.
pub fn object_key(unique_id: &str, upload: &UploadDoc) -> SinkResult<String> {
    let room_id = upload.room_id.as_deref().ok_or_else(|| SinkError::IncompleteRecord {
        id: upload.id.clone(),
        field: "rid",
    })?;
    let user_id = upload.user_id.as_deref().ok_or_else(|| SinkError::IncompleteRecord {
        id: upload.id.clone(),
        field: "userId",
    })?;
    Ok(format!(
        "{}/Uploads/{}/{}/{}",
        unique_id, room_id, user_id, upload.id
    ))
}

/// Sink that uploads blobs to an S3 bucket. Credentials and region come from
/// the environment, as with the rest of the AWS tooling.
pub struct S3Sink {
    store: AmazonS3,
    bucket: String,
    unique_id: String,
}

impl S3Sink {
    /// `unique_id` is the cluster-wide installation id every object key is
    /// prefixed with.
    pub fn new(bucket: String, unique_id: String) -> SinkResult<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| SinkError::ConfigError(e.to_string()))?;
        tracing::info!(bucket = %bucket, "S3 sink ready");
        Ok(Self {
            store,
            bucket,
            unique_id,
        })
    }
}

#[async_trait]
impl BlobSink for S3Sink {
    async fn put(
        &self,
        _filename: &str,
        data: Vec<u8>,
        upload: &UploadDoc,
    ) -> SinkResult<String> {
        let key = object_key(&self.unique_id, upload)?;
        let size = data.len();
        let location = Path::from(key.clone());

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentDisposition,
            format!(
                "inline; filename=\"{}\"",
                encode_disposition_name(&upload.name)
            )
            .into(),
        );
        if let Some(content_type) = &upload.content_type {
            attributes.insert(Attribute::ContentType, content_type.clone().into());
        }
        let mut options = PutOptions::default();
        options.attributes = attributes;

        let start = std::time::Instant::now();
        self.store
            .put_opts(&location, PutPayload::from(Bytes::from(data)), options)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    "S3 upload failed"
                );
                SinkError::WriteFailed(e.to_string())
            })?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "uploaded blob"
        );
        Ok(key)
    }

    fn target(&self) -> StorageTarget {
        StorageTarget::AmazonS3
    }
}
