//! Error types for account operations.

use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The password did not authenticate the stored ciphertext.
    #[error("Wrong password")]
    WrongPassword,

    /// A signing operation was attempted without an unlocked session.
    #[error("Account is locked: {0}")]
    AccountLocked(String),

    /// Stored ciphertext or exported key material could not be decoded.
    #[error("Malformed key material: {0}")]
    MalformedKeyMaterial(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Invalid account id: {0}")]
    InvalidId(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias for account operations.
pub type Result<T> = std::result::Result<T, AccountError>;
