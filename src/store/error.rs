//! Storage Errors
//!
//! Errors raised by the document collection and its write-ahead log.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors from storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Constraint Errors
    // -------------------------------------------------------------------------
    /// A unique index rejected the write
    #[error("E11000 duplicate key error collection: {collection} index: {index} dup key: {key_value}")]
    DuplicateKey {
        collection: String,
        index: String,
        /// `{field: value}` of the conflicting key
        key_value: Value,
    },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid ObjectId: {0}")]
    InvalidObjectId(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Classification of a failed write, as seen by callers of the store
#[derive(Debug, Clone, PartialEq)]
pub enum WriteFailure {
    /// A unique index rejected the write
    Duplicate { index: String, key_value: Value },

    /// Anything else
    Other,
}
