//! Storage sinks for migrated blobs.
//!
//! A [`BlobSink`] persists one blob somewhere and returns the opaque location
//! key the migration log records. Two implementations: a local directory and
//! an S3 bucket. Location keys are sink-defined — a filesystem path for the
//! local sink, an object key for the S3 sink — and the log treats them as
//! opaque strings.

pub mod factory;
pub mod local;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_sink;
pub use local::LocalSink;
pub use s3::S3Sink;
pub use traits::{BlobSink, SinkError, SinkResult};
