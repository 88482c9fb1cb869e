//! Error types for the dimension engine
//!
//! All failures surface as typed values from the originating call; there
//! is no global error channel and the engine never retries on its own.
//!
//! Categories:
//! - **Config**: invalid constructor argument, raised before any I/O
//! - **Schema**: missing or incompatibly-typed column
//! - **Storage / Io**: the backing table failed a read or write
//! - **InvariantViolation**: duplicate current row, hash mismatch or
//!   other external tampering detected at runtime

use std::io;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the dimension engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid constructor argument; raised at construction, before I/O.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Table missing a required column, or column type incompatible.
    #[error("schema error: {0}")]
    Schema(String),

    /// Underlying table read or write failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error from the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Duplicate current per key, hash mismatch after write-back, or
    /// other tampering with engine-maintained state.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl Error {
    /// Check if this error is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this error is a schema error.
    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema(_))
    }

    /// Check if this error originated in the backing store.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_))
    }

    /// Check if this error is an invariant violation.
    ///
    /// An invariant violation indicates a bug or external tampering, not
    /// a recoverable condition.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation(_))
    }
}
