//! Core domain types and shared logic for pinshift.
//!
//! This crate defines the data model used across the other crates:
//! - Pin records returned by the pinning service
//! - Chunk planning for chunked uploads
//! - Atomic-unit amounts for price and balance checks
//! - Upload session lifecycle states
//! - Application configuration

pub mod amount;
pub mod chunk;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod pin;
pub mod upload;

pub use amount::AtomicAmount;
pub use chunk::{ChunkPlan, ChunkSpan};
pub use error::{Error, Result};
pub use pin::PinRecord;
pub use upload::SessionState;

/// Default chunk size: 25 MB
pub const DEFAULT_CHUNK_SIZE: u64 = 25_000_000;

/// Default number of chunks in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default page size for pin listings.
pub const DEFAULT_PAGE_LIMIT: u64 = 1000;

/// Default minimum interval between operator-visible progress reports.
pub const DEFAULT_REPORT_INTERVAL_MS: u64 = 5000;
