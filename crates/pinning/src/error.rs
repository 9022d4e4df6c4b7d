//! Pinning error types.

use thiserror::Error;

/// Errors raised while listing pins.
#[derive(Debug, Error)]
pub enum PinningError {
    /// The listing endpoint answered with a non-success status.
    #[error("pin listing failed ({status}): {body}")]
    Transport { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid listing response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Core(#[from] pinshift_core::Error),
}

/// Result type for pinning operations.
pub type PinningResult<T> = std::result::Result<T, PinningError>;
