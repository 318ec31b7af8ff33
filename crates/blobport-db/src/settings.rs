//! Read access to the instance settings collection.

use blobport_core::constants::{SETTINGS_COLLECTION, UNIQUE_ID_SETTING};
use mongodb::bson::doc;
use mongodb::{Collection, Database};
use serde::Deserialize;

use crate::error::{DbError, DbResult};

#[derive(Debug, Deserialize)]
struct SettingDoc {
    value: String,
}

#[derive(Clone)]
pub struct SettingsRepository {
    collection: Collection<SettingDoc>,
}

impl SettingsRepository {
    pub fn new(db: Database) -> Self {
        Self {
            collection: db.collection(SETTINGS_COLLECTION),
        }
    }

    /// The cluster-wide installation id. Every S3 object key is prefixed
    /// with it, so a missing setting aborts the run.
    pub async fn unique_id(&self) -> DbResult<String> {
        let setting = self
            .collection
            .find_one(doc! { "_id": UNIQUE_ID_SETTING })
            .await?;
        setting.map(|s| s.value).ok_or(DbError::MissingUniqueId)
    }
}
