//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid chunk size: {0} (must be positive)")]
    InvalidChunkSize(u64),

    #[error("invalid concurrency: {0} (must be positive)")]
    InvalidConcurrency(usize),

    #[error("invalid page limit: {0} (must be positive)")]
    InvalidPageLimit(u64),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crate::upload::SessionState,
        to: crate::upload::SessionState,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
