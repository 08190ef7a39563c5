//! Security error types.

/// Result type for security operations.
pub type Result<T> = std::result::Result<T, SecurityError>;

/// Security error type.
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    /// Encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Decryption error.
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Key material error.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}
