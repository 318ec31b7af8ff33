//! Fixed names on the Rocket.Chat side of the migration.

/// Collection holding the upload records.
pub const UPLOADS_COLLECTION: &str = "rocketchat_uploads";

/// Collection holding instance settings.
pub const SETTINGS_COLLECTION: &str = "rocketchat_settings";

/// Settings document id carrying the cluster-wide installation id.
pub const UNIQUE_ID_SETTING: &str = "uniqueID";

/// Store tag of an upload whose bytes still live in GridFS. Only records
/// tagged with this value are eligible for migration.
pub const GRIDFS_STORE: &str = "GridFS:Uploads";
