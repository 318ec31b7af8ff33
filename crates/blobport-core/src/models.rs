//! Data model shared across the migration phases.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::GRIDFS_STORE;

/// An upload record as stored in the uploads collection.
///
/// Read-only input for the migration: the tool never mutates a record except
/// through the update phase, and only via the fields set there. Unknown
/// fields in the document are ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDoc {
    #[serde(rename = "_id")]
    pub id: String,
    /// Readiness flag set by Rocket.Chat once all chunks are written.
    #[serde(default)]
    pub complete: bool,
    /// Which backend currently holds the blob, e.g. `"GridFS:Uploads"`.
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    /// Display filename shown to users.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    /// Room the file was uploaded to.
    #[serde(rename = "rid", default)]
    pub room_id: Option<String>,
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
}

impl UploadDoc {
    /// Whether the blob behind this record still lives in GridFS.
    pub fn is_gridfs(&self) -> bool {
        self.store.as_deref() == Some(GRIDFS_STORE)
    }

    /// Filename the blob is dumped under: the record id, plus the original
    /// extension when the record carries one.
    pub fn dump_filename(&self) -> String {
        match self.extension.as_deref() {
            Some(ext) if !ext.is_empty() => format!("{}.{}", self.id, ext),
            _ => self.id.clone(),
        }
    }
}

/// One row of the migration log: the durable link between a migrated blob
/// and its new location. Field order is the on-disk CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Source record id, also the GridFS file id.
    pub id: String,
    /// Filename the blob was dumped under.
    pub file: String,
    /// Uploads collection the record came from.
    pub collection: String,
    /// Sink-defined location key: a filesystem path for the local sink, an
    /// object key for the S3 sink.
    pub key: String,
}

/// Destination storage backend, as selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTarget {
    AmazonS3,
    FileSystem,
}

impl StorageTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTarget::AmazonS3 => "AmazonS3",
            StorageTarget::FileSystem => "FileSystem",
        }
    }

    /// Store tag written into migrated upload records, e.g. `"AmazonS3:Uploads"`.
    pub fn store_tag(&self) -> String {
        format!("{}:Uploads", self.as_str())
    }

    /// Application-facing path for a migrated upload. Set as both `path` and
    /// `url` on the record.
    pub fn ufs_path(&self, id: &str, filename: &str) -> String {
        format!("/ufs/{}:Uploads/{}/{}", self.as_str(), id, filename)
    }
}

impl fmt::Display for StorageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(store: Option<&str>, complete: bool, extension: Option<&str>) -> UploadDoc {
        UploadDoc {
            id: "abc123".to_string(),
            complete,
            store: store.map(String::from),
            extension: extension.map(String::from),
            name: "photo.png".to_string(),
            user_id: Some("u1".to_string()),
            room_id: Some("r1".to_string()),
            content_type: Some("image/png".to_string()),
        }
    }

    #[test]
    fn gridfs_store_tag_is_eligible() {
        assert!(upload(Some("GridFS:Uploads"), true, None).is_gridfs());
        assert!(!upload(Some("FileSystem:Uploads"), true, None).is_gridfs());
        assert!(!upload(None, true, None).is_gridfs());
    }

    #[test]
    fn dump_filename_appends_extension() {
        assert_eq!(upload(None, true, Some("png")).dump_filename(), "abc123.png");
        assert_eq!(upload(None, true, None).dump_filename(), "abc123");
        // Empty extension behaves like no extension.
        assert_eq!(upload(None, true, Some("")).dump_filename(), "abc123");
    }

    #[test]
    fn target_store_tag_and_path() {
        assert_eq!(StorageTarget::AmazonS3.store_tag(), "AmazonS3:Uploads");
        assert_eq!(StorageTarget::FileSystem.store_tag(), "FileSystem:Uploads");
        assert_eq!(
            StorageTarget::FileSystem.ufs_path("abc123", "abc123.png"),
            "/ufs/FileSystem:Uploads/abc123/abc123.png"
        );
    }
}
