//! Error types for textgram

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Crate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected index declaration (reported at configuration load)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed document input
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Index build invoked without an active write transaction
    #[error("Index build requires an active transaction")]
    NoTransaction,

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document id not present in the store
    #[error("Unknown document: {0}")]
    UnknownDocument(u32),

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid document error
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Error::InvalidDocument(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Create a serialization error
    pub fn serialize(msg: impl Into<String>) -> Self {
        Error::Serialize(msg.into())
    }
}
