use thiserror::Error;

/// Database operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("MongoDB error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The `uniqueID` settings document is absent. Fatal: S3 object keys
    /// cannot be computed without it.
    #[error("uniqueID setting not found in the settings collection")]
    MissingUniqueId,
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
