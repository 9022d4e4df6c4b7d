//! Upload error types.

use pinshift_core::AtomicAmount;
use thiserror::Error;

/// Fatal errors for an upload session.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Pre-flight check failed; the transfer was never started.
    #[error("insufficient balance: price {price}, balance {balance}, short by {deficit}")]
    InsufficientBalance {
        price: AtomicAmount,
        balance: AtomicAmount,
        deficit: AtomicAmount,
    },

    #[error("funding check failed: {0}")]
    Funding(#[from] FundingError),

    #[error("upload failed: {0}")]
    Transfer(#[from] TransferError),

    /// The terminal event and the upload call disagree on the transaction.
    #[error("transaction id mismatch: completion event reported {event}, upload returned {returned}")]
    ReceiptMismatch { event: String, returned: String },

    #[error("progress reporter failed: {0}")]
    Reporter(#[from] tokio::task::JoinError),

    #[error("source error: {0}")]
    Source(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] pinshift_core::Error),
}

/// Errors raised by a chunked-transfer client.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("node request failed ({status}): {body}")]
    Transport { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid node response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A chunk still failed after every retry.
    #[error("chunk {chunk_id} failed after {attempts} attempts: {detail}")]
    ChunkFailed {
        chunk_id: u64,
        attempts: u32,
        detail: String,
    },

    #[error("chunk size {size} rejected by node (allowed {min}..={max})")]
    ChunkSizeRejected { size: u64, min: u64, max: u64 },

    #[error("source read failed: {0}")]
    Source(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors raised by balance and price queries.
#[derive(Debug, Error)]
pub enum FundingError {
    #[error("funding request failed ({status}): {body}")]
    Transport { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid funding response: {0}")]
    Decode(String),

    #[error("no funded address configured")]
    MissingAddress,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type for upload operations.
pub type UploadResult<T> = std::result::Result<T, UploadError>;
