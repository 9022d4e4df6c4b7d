//! Upload coordinator.
//!
//! Runs one upload session end to end: pre-flight funding check, transfer
//! through a configured `ChunkedTransfer`, progress reporting on a
//! dedicated task, and a single terminal outcome.

use crate::error::{UploadError, UploadResult};
use crate::funding::{Funding, FundingQuote, quote};
use crate::progress::{IntervalGate, ProgressTracker};
use crate::report::{ProgressSink, ReportOutcome, TracingSink, run_reporter};
use crate::transfer::{ChunkedTransfer, UploadSource};
use pinshift_core::{AtomicAmount, ChunkPlan, SessionState};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Default capacity of the event channel between transfer and reporter.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Summary of a completed upload.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadReceipt {
    pub transaction_id: String,
    pub total_bytes: u64,
    pub chunks: u64,
    pub chunk_errors: u64,
    pub elapsed: Duration,
    pub price: AtomicAmount,
}

/// Coordinates upload sessions for one configured transfer client.
pub struct Coordinator<T, F> {
    transfer: T,
    funding: F,
    report_interval: Duration,
    event_buffer: usize,
}

/// Builder for [`Coordinator`].
pub struct CoordinatorBuilder<T, F> {
    transfer: T,
    funding: F,
    report_interval: Duration,
    event_buffer: usize,
}

impl<T, F> CoordinatorBuilder<T, F>
where
    T: ChunkedTransfer,
    F: Funding,
{
    /// Minimum interval between operator-visible progress reports.
    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Capacity of the event channel.
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    pub fn build(self) -> UploadResult<Coordinator<T, F>> {
        if self.transfer.chunk_size() == 0 {
            return Err(pinshift_core::Error::InvalidChunkSize(0).into());
        }
        if self.transfer.concurrency() == 0 {
            return Err(pinshift_core::Error::InvalidConcurrency(0).into());
        }
        Ok(Coordinator {
            transfer: self.transfer,
            funding: self.funding,
            report_interval: self.report_interval,
            event_buffer: self.event_buffer.max(1),
        })
    }
}

impl<T, F> Coordinator<T, F>
where
    T: ChunkedTransfer,
    F: Funding,
{
    pub fn builder(transfer: T, funding: F) -> CoordinatorBuilder<T, F> {
        CoordinatorBuilder {
            transfer,
            funding,
            report_interval: Duration::from_millis(pinshift_core::DEFAULT_REPORT_INTERVAL_MS),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    /// Quote price and balance for `bytes` without uploading anything.
    pub async fn quote(&self, bytes: u64) -> UploadResult<FundingQuote> {
        Ok(quote(&self.funding, bytes).await?)
    }

    /// Upload `source`, reporting progress through `tracing`.
    pub async fn upload(&self, source: UploadSource) -> UploadResult<UploadReceipt> {
        self.upload_with_sink(source, TracingSink).await
    }

    /// Upload `source`, reporting progress to `sink`.
    pub async fn upload_with_sink<S>(
        &self,
        source: UploadSource,
        sink: S,
    ) -> UploadResult<UploadReceipt>
    where
        S: ProgressSink + 'static,
    {
        let mut state = SessionState::Idle;
        let total_bytes = source.total_size();
        let plan = ChunkPlan::new(total_bytes, self.transfer.chunk_size())?;

        let quote = match self.preflight(total_bytes).await {
            Ok(quote) => quote,
            Err(e) => {
                state.transition(SessionState::Failed)?;
                return Err(e);
            }
        };

        state.transition(SessionState::InProgress)?;
        tracing::info!(
            total_bytes,
            chunks = plan.chunk_count(),
            chunk_size = plan.chunk_size(),
            concurrency = self.transfer.concurrency(),
            "Upload started"
        );

        let started = Instant::now();
        let (events_tx, events_rx) = mpsc::channel(self.event_buffer);
        let reporter = tokio::spawn(run_reporter(
            events_rx,
            ProgressTracker::new(total_bytes, started),
            IntervalGate::new(self.report_interval),
            sink,
        ));

        // The sender moves into the transfer and is dropped when it returns,
        // which lets the reporter finish even without a terminal event.
        let result = self.transfer.transfer(source, events_tx).await;
        let ReportOutcome {
            transaction_id: event_id,
            snapshot,
            mut tracker,
            mut sink,
            ..
        } = reporter.await?;

        let returned = match result {
            Ok(returned) => returned,
            Err(e) => {
                state.transition(SessionState::Failed)?;
                tracing::error!(
                    error = %e,
                    uploaded = snapshot.uploaded_bytes,
                    total_bytes,
                    "Upload failed"
                );
                return Err(e.into());
            }
        };

        let (transaction_id, snapshot) = match event_id {
            Some(event) if event != returned => {
                state.transition(SessionState::Failed)?;
                tracing::error!(event = %event, returned = %returned, "Transaction id mismatch");
                return Err(UploadError::ReceiptMismatch { event, returned });
            }
            Some(event) => (event, snapshot),
            None => {
                tracing::warn!(
                    transaction_id = %returned,
                    "Transfer returned without a completion event"
                );
                (returned, tracker.complete(Instant::now()))
            }
        };

        state.transition(SessionState::Completed)?;
        sink.completed(&snapshot, &transaction_id);

        Ok(UploadReceipt {
            transaction_id,
            total_bytes,
            chunks: snapshot.chunks_completed,
            chunk_errors: snapshot.chunk_errors,
            elapsed: started.elapsed(),
            price: quote.price,
        })
    }

    /// Confirm the funded balance covers the price of `bytes`.
    async fn preflight(&self, bytes: u64) -> UploadResult<FundingQuote> {
        let quote = quote(&self.funding, bytes).await?;
        if let Some(deficit) = quote.deficit() {
            tracing::error!(
                price = %quote.price,
                balance = %quote.balance,
                deficit = %deficit,
                "Insufficient balance for upload"
            );
            return Err(UploadError::InsufficientBalance {
                price: quote.price,
                balance: quote.balance,
                deficit,
            });
        }
        tracing::info!(
            price = %quote.price,
            balance = %quote.balance,
            "Balance covers upload price"
        );
        Ok(quote)
    }
}
