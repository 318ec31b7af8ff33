//! Core types for blobport.
//!
//! Shared models, configuration, and constants used by the database,
//! storage, and migration crates. This crate deliberately has no I/O.

pub mod config;
pub mod constants;
pub mod models;

pub use config::MongoConfig;
pub use models::{LogEntry, StorageTarget, UploadDoc};
