//! Error types for Pokedex
//!
//! Provides the error type surfaced by the gateway, the seed service and the
//! fetch adapter. Storage-layer failures live in [`crate::store::StoreError`]
//! and are translated into this type exactly once, at the gateway boundary.

use thiserror::Error;

/// Result type alias using PokedexError
pub type Result<T> = std::result::Result<T, PokedexError>;

/// Static message returned to callers for any outbound fetch failure.
pub const FETCH_FAILURE_MESSAGE: &str = "This is an error - check server logs";

/// Which stage of an outbound request failed.
///
/// The caller-facing message is identical for every kind; the kind only
/// exists so Rust callers can branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, DNS, TLS or timeout failure
    Transport,

    /// The server answered with a non-2xx status
    Status,

    /// The body could not be decoded into the requested shape
    Decode,
}

/// Unified error type for Pokedex operations
#[derive(Debug, Error)]
pub enum PokedexError {
    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Pokemon already exists in db {0}")]
    DuplicateKey(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    // -------------------------------------------------------------------------
    // Collaborator Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    StorageFailure(String),

    #[error("{}", FETCH_FAILURE_MESSAGE)]
    FetchFailure { kind: FetchErrorKind },

    // -------------------------------------------------------------------------
    // Process Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PokedexError {
    /// Whether this is a "not found"-class error
    pub fn is_not_found(&self) -> bool {
        matches!(self, PokedexError::NotFound(_))
    }
}
