//! Chunked, progress-tracked uploads for pinshift.
//!
//! This crate provides:
//! - The `ChunkedTransfer` and `Funding` abstractions over a storage node
//! - `Coordinator`, which runs a funded, throttled, single-outcome upload
//! - Progress metrics and the interval gate used for report throttling
//! - `NodeUploader` and `NodeFunding`, the HTTP implementations

pub mod coordinator;
pub mod error;
pub mod funding;
pub mod node;
pub mod progress;
pub mod report;
pub mod transfer;

pub use coordinator::{Coordinator, CoordinatorBuilder, UploadReceipt};
pub use error::{FundingError, TransferError, UploadError, UploadResult};
pub use funding::{Funding, FundingQuote};
pub use node::{NodeFunding, NodeUploader, NodeUploaderBuilder};
pub use progress::{IntervalGate, ProgressSnapshot, ProgressTracker};
pub use report::{ProgressSink, ReportOutcome, TracingSink};
pub use transfer::{ChunkedTransfer, EventSender, TransferEvent, UploadSource};
