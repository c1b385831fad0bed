//! Common error types for HiveWatch

use thiserror::Error;

/// Common result type for HiveWatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across HiveWatch crates
///
/// `Validation` is never retried automatically; `Unavailable` may be
/// retried by the user after a delay; `Storage` is surfaced while the
/// verified result is retained so storing can be retried without
/// re-verification. A negative verification verdict is not an error
/// and never appears here.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Classifier not yet loaded or failed to load
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Server unreachable from the field client
    #[error("Network error: {0}")]
    Network(String),

    /// Persistence failed after a positive verification
    #[error("Storage error: {0}")]
    Storage(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
