//! Local-directory sink.

use std::path::PathBuf;

use async_trait::async_trait;
use blobport_core::{StorageTarget, UploadDoc};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::traits::{BlobSink, SinkError, SinkResult};

/// Characters allowed in a stored filename besides alphanumerics.
const SAFE_PUNCTUATION: &str = " .-_%";

/// Strip a filename down to alphanumerics plus space, `.`, `-`, `_`, `%`,
/// then trim trailing whitespace. Two source names can sanitize to the same
/// string; the second write wins.
pub fn sanitize_filename(filename: &str) -> String {
    let kept: String = filename
        .chars()
        .filter(|c| c.is_alphanumeric() || SAFE_PUNCTUATION.contains(*c))
        .collect();
    kept.trim_end().to_string()
}

/// Sink that writes blobs as flat files into one directory.
pub struct LocalSink {
    out_dir: PathBuf,
}

impl LocalSink {
    /// Create the sink, creating `directory` (and parents) if absent.
    pub async fn new(directory: impl Into<PathBuf>) -> SinkResult<Self> {
        let out_dir = directory.into();
        fs::create_dir_all(&out_dir).await.map_err(|e| {
            SinkError::ConfigError(format!(
                "failed to create output directory {}: {}",
                out_dir.display(),
                e
            ))
        })?;
        tracing::info!(directory = %out_dir.display(), "local sink ready");
        Ok(Self { out_dir })
    }
}

#[async_trait]
impl BlobSink for LocalSink {
    async fn put(
        &self,
        filename: &str,
        data: Vec<u8>,
        _upload: &UploadDoc,
    ) -> SinkResult<String> {
        let safe_filename = sanitize_filename(filename);
        let path = self.out_dir.join(&safe_filename);

        let mut file = fs::File::create(&path).await.map_err(|e| {
            SinkError::WriteFailed(format!("failed to create {}: {}", path.display(), e))
        })?;
        file.write_all(&data).await.map_err(|e| {
            SinkError::WriteFailed(format!("failed to write {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            SinkError::WriteFailed(format!("failed to sync {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = data.len(),
            "saved blob"
        );
        Ok(path.to_string_lossy().into_owned())
    }

    fn target(&self) -> StorageTarget {
        StorageTarget::FileSystem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn upload() -> UploadDoc {
        UploadDoc {
            id: "abc123".to_string(),
            complete: true,
            store: Some("GridFS:Uploads".to_string()),
            extension: Some("txt".to_string()),
            name: "notes.txt".to_string(),
            user_id: Some("u1".to_string()),
            room_id: Some("r1".to_string()),
            content_type: None,
        }
    }

    #[test]
    fn sanitize_drops_unsafe_characters() {
        assert_eq!(sanitize_filename("a/b*c.txt"), "abc.txt");
        assert_eq!(sanitize_filename("weird:<>name?.png"), "weirdname.png");
        assert_eq!(sanitize_filename("ok-file_100%.dat"), "ok-file_100%.dat");
    }

    #[test]
    fn sanitize_keeps_spaces_but_trims_trailing_whitespace() {
        assert_eq!(sanitize_filename("my report.pdf"), "my report.pdf");
        assert_eq!(sanitize_filename("trailing.txt  "), "trailing.txt");
        assert_eq!(sanitize_filename("dropped/   "), "dropped");
    }

    #[tokio::test]
    async fn put_writes_payload_and_returns_path() {
        let dir = tempdir().unwrap();
        let sink = LocalSink::new(dir.path()).await.unwrap();

        let key = sink
            .put("abc123.txt", b"hello".to_vec(), &upload())
            .await
            .unwrap();

        assert!(key.ends_with("abc123.txt"));
        assert_eq!(std::fs::read(&key).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn put_same_filename_twice_overwrites() {
        // Last-write-wins on collision is intentional.
        let dir = tempdir().unwrap();
        let sink = LocalSink::new(dir.path()).await.unwrap();

        let first = sink.put("same.txt", b"one".to_vec(), &upload()).await.unwrap();
        let second = sink.put("same.txt", b"two".to_vec(), &upload()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }

    #[tokio::test]
    async fn new_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        let sink = LocalSink::new(&nested).await.unwrap();

        sink.put("f.txt", b"x".to_vec(), &upload()).await.unwrap();
        assert!(nested.join("f.txt").is_file());
    }
}
