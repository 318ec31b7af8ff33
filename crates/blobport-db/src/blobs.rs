//! GridFS access for the blob bytes behind upload records.

use futures::AsyncReadExt;
use mongodb::bson::Bson;
use mongodb::gridfs::GridFsBucket;
use mongodb::options::GridFsBucketOptions;
use mongodb::Database;

use crate::error::DbResult;

/// Repository over the GridFS buckets. The bucket name equals the uploads
/// collection name, so one repository serves every collection the migration
/// log references.
#[derive(Clone)]
pub struct BlobRepository {
    db: Database,
}

impl BlobRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn bucket(&self, collection: &str) -> GridFsBucket {
        self.db.gridfs_bucket(
            GridFsBucketOptions::builder()
                .bucket_name(collection.to_string())
                .build(),
        )
    }

    /// Read the full blob for an upload id into memory.
    pub async fn read(&self, collection: &str, id: &str) -> DbResult<Vec<u8>> {
        let mut stream = self
            .bucket(collection)
            .open_download_stream(Bson::String(id.to_string()))
            .await?;
        let mut data = Vec::new();
        stream.read_to_end(&mut data).await?;
        Ok(data)
    }

    /// Delete the blob (file document and chunks) for an upload id.
    pub async fn delete(&self, collection: &str, id: &str) -> DbResult<()> {
        self.bucket(collection)
            .delete(Bson::String(id.to_string()))
            .await?;
        Ok(())
    }
}
