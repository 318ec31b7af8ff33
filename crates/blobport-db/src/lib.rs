//! MongoDB data-access layer.
//!
//! Repositories over the uploads collection, the GridFS buckets holding the
//! blob bytes, and the settings collection. All repositories share one
//! connection-pooled client and are safe to clone into concurrent workers.

pub mod blobs;
pub mod client;
pub mod error;
pub mod settings;
pub mod uploads;

pub use blobs::BlobRepository;
pub use client::connect;
pub use error::{DbError, DbResult};
pub use settings::SettingsRepository;
pub use uploads::UploadRepository;
