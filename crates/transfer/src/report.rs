//! Reporting task for chunk lifecycle events.
//!
//! A single task drains the event channel and owns the session counters,
//! so events are handled one at a time in arrival order without locking.

use crate::progress::{IntervalGate, ProgressSnapshot, ProgressTracker};
use crate::transfer::TransferEvent;
use pinshift_core::ChunkSpan;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Destination for progress reports.
pub trait ProgressSink: Send {
    /// A chunk was acknowledged. `visible` is false when the report falls
    /// inside the throttling interval and belongs in the audit log only.
    fn progress(&mut self, snapshot: &ProgressSnapshot, visible: bool);

    /// A chunk attempt failed and will be retried by the transfer client.
    fn chunk_failed(&mut self, chunk: &ChunkSpan, attempt: u32, error: &str);

    /// The session completed.
    fn completed(&mut self, snapshot: &ProgressSnapshot, transaction_id: &str);
}

/// Reports through `tracing`: visible progress at info, throttled progress
/// at debug, chunk failures at warn.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn progress(&mut self, snapshot: &ProgressSnapshot, visible: bool) {
        if visible {
            tracing::info!(
                uploaded = snapshot.uploaded_bytes,
                total = snapshot.total_bytes,
                percent = format_args!("{:.2}", snapshot.percent),
                throughput = format_args!("{:.0}", snapshot.throughput),
                eta_secs = format_args!("{:.0}", snapshot.eta_secs),
                "Upload progress"
            );
        } else {
            tracing::debug!(
                uploaded = snapshot.uploaded_bytes,
                total = snapshot.total_bytes,
                percent = format_args!("{:.2}", snapshot.percent),
                "Upload progress"
            );
        }
    }

    fn chunk_failed(&mut self, chunk: &ChunkSpan, attempt: u32, error: &str) {
        tracing::warn!(
            chunk_id = chunk.id,
            offset = chunk.offset,
            attempt,
            error,
            "Chunk upload failed, will retry"
        );
    }

    fn completed(&mut self, snapshot: &ProgressSnapshot, transaction_id: &str) {
        tracing::info!(
            transaction_id,
            total = snapshot.total_bytes,
            elapsed_secs = snapshot.elapsed.as_secs(),
            "Upload complete"
        );
    }
}

/// What the reporting task observed by the time it stopped.
///
/// The sink comes back with the outcome so the caller can report
/// completion once the transaction id has been confirmed.
#[derive(Debug)]
pub struct ReportOutcome<S> {
    /// Transaction id from the terminal event, if one arrived.
    pub transaction_id: Option<String>,
    pub snapshot: ProgressSnapshot,
    /// Operator-visible progress reports emitted.
    pub visible_reports: u64,
    pub tracker: ProgressTracker,
    pub sink: S,
}

/// Drain `events` until the terminal event arrives or every sender is gone.
///
/// Events after the terminal event are not processed. The completion
/// report is left to the caller.
pub async fn run_reporter<S>(
    mut events: mpsc::Receiver<TransferEvent>,
    mut tracker: ProgressTracker,
    mut gate: IntervalGate,
    mut sink: S,
) -> ReportOutcome<S>
where
    S: ProgressSink,
{
    let mut visible_reports = 0u64;
    let mut transaction_id = None;

    while let Some(event) = events.recv().await {
        let now = Instant::now();
        match event {
            TransferEvent::ChunkUploaded {
                chunk,
                total_uploaded,
            } => {
                let snapshot = tracker.record_chunk(&chunk, total_uploaded, now);
                let visible = gate.check(now);
                if visible {
                    visible_reports += 1;
                }
                sink.progress(&snapshot, visible);
            }
            TransferEvent::ChunkFailed {
                chunk,
                attempt,
                error,
            } => {
                tracker.record_error();
                sink.chunk_failed(&chunk, attempt, &error);
            }
            TransferEvent::Done { transaction_id: id } => {
                tracker.complete(now);
                transaction_id = Some(id);
                break;
            }
        }
    }

    ReportOutcome {
        transaction_id,
        snapshot: tracker.snapshot(Instant::now()),
        visible_reports,
        tracker,
        sink,
    }
}
