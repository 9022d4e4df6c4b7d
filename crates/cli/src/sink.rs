use crate::format::{format_bytes, format_duration, format_rate};
use pinshift_core::ChunkSpan;
use pinshift_transfer::{ProgressSink, ProgressSnapshot};

/// Human-readable progress lines. Throttled reports go to debug so they
/// only reach the log file.
#[derive(Debug, Default)]
pub struct ConsoleSink;

fn progress_line(snapshot: &ProgressSnapshot) -> String {
    let eta = snapshot
        .eta()
        .map(format_duration)
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{:.2}% ({} / {}) at {}, elapsed {}, ETA {}",
        snapshot.percent,
        format_bytes(snapshot.uploaded_bytes),
        format_bytes(snapshot.total_bytes),
        format_rate(snapshot.throughput),
        format_duration(snapshot.elapsed),
        eta
    )
}

impl ProgressSink for ConsoleSink {
    fn progress(&mut self, snapshot: &ProgressSnapshot, visible: bool) {
        let line = progress_line(snapshot);
        if visible {
            tracing::info!("Progress: {line}");
        } else {
            tracing::debug!("Progress: {line}");
        }
    }

    fn chunk_failed(&mut self, chunk: &ChunkSpan, attempt: u32, error: &str) {
        tracing::warn!(
            "Chunk {} (offset {}, {}) failed on attempt {}, will retry: {}",
            chunk.id,
            chunk.offset,
            format_bytes(chunk.size),
            attempt + 1,
            error
        );
    }

    fn completed(&mut self, snapshot: &ProgressSnapshot, transaction_id: &str) {
        tracing::info!(
            "Upload complete: {} in {}, transaction {}",
            format_bytes(snapshot.total_bytes),
            format_duration(snapshot.elapsed),
            transaction_id
        );
    }
}
