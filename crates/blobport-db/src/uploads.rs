//! Data access for upload records.

use blobport_core::{LogEntry, StorageTarget, UploadDoc};
use futures::{Stream, StreamExt};
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};

use crate::error::{DbError, DbResult};

/// Cursor batch size for the dump phase.
const CURSOR_BATCH_SIZE: u32 = 50;

/// Repository over upload records. One repository serves every collection
/// the migration log references, so the collection name is per-call.
#[derive(Clone)]
pub struct UploadRepository {
    db: Database,
}

impl UploadRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self, name: &str) -> Collection<UploadDoc> {
        self.db.collection(name)
    }

    pub async fn count(&self, collection: &str) -> DbResult<u64> {
        Ok(self.collection(collection).count_documents(doc! {}).await?)
    }

    /// Stream every upload record in the collection. Batched reads with the
    /// server-side cursor timeout disabled: large collections can take longer
    /// to drain than the default cursor lifetime.
    pub async fn stream(
        &self,
        collection: &str,
    ) -> DbResult<impl Stream<Item = Result<UploadDoc, DbError>>> {
        let cursor = self
            .collection(collection)
            .find(doc! {})
            .batch_size(CURSOR_BATCH_SIZE)
            .no_cursor_timeout(true)
            .await?;
        Ok(cursor.map(|item| item.map_err(DbError::from)))
    }

    /// Point an upload record at its migrated location. Returns `false` when
    /// no record matches the log entry's id.
    pub async fn relocate(&self, entry: &LogEntry, target: StorageTarget) -> DbResult<bool> {
        let update = relocation_update(entry, target);
        let result = self
            .collection(&entry.collection)
            .update_one(doc! { "_id": &entry.id }, doc! { "$set": update })
            .await?;
        Ok(result.matched_count > 0)
    }
}

/// The `$set` document for one relocated record.
fn relocation_update(entry: &LogEntry, target: StorageTarget) -> Document {
    let path = target.ufs_path(&entry.id, &entry.file);
    let mut update = doc! {
        "store": target.store_tag(),
        "path": &path,
        "url": &path,
    };
    if target == StorageTarget::AmazonS3 {
        update.insert("AmazonS3", doc! { "path": &entry.key });
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LogEntry {
        LogEntry {
            id: "abc123".to_string(),
            file: "abc123.png".to_string(),
            collection: "rocketchat_uploads".to_string(),
            key: "U1/Uploads/R/UID/abc123".to_string(),
        }
    }

    #[test]
    fn filesystem_update_sets_store_path_and_url() {
        let update = relocation_update(&entry(), StorageTarget::FileSystem);
        assert_eq!(update.get_str("store").unwrap(), "FileSystem:Uploads");
        assert_eq!(
            update.get_str("path").unwrap(),
            "/ufs/FileSystem:Uploads/abc123/abc123.png"
        );
        assert_eq!(update.get_str("url").unwrap(), update.get_str("path").unwrap());
        assert!(update.get("AmazonS3").is_none());
    }

    #[test]
    fn s3_update_also_records_the_object_key() {
        let update = relocation_update(&entry(), StorageTarget::AmazonS3);
        assert_eq!(update.get_str("store").unwrap(), "AmazonS3:Uploads");
        let nested = update.get_document("AmazonS3").unwrap();
        assert_eq!(nested.get_str("path").unwrap(), "U1/Uploads/R/UID/abc123");
    }
}
