//! Storage error types.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Could not open a connection / pool.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// A query failed.
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// A stored row does not match the expected shape.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}
