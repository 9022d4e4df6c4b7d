//! Upload session counters and progress metrics.
//!
//! Metrics are recomputed from the running totals on every event. There is
//! no smoothing: throughput is the session average so far, and the ETA is
//! the remaining bytes divided by that average. Right after the session
//! starts the elapsed time is close to zero, so throughput can be huge or
//! non-finite and the ETA meaningless; callers render such values as
//! unknown instead of treating them as errors.

use pinshift_core::ChunkSpan;
use std::time::Duration;
use tokio::time::Instant;

/// Point-in-time view of an upload session.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressSnapshot {
    pub uploaded_bytes: u64,
    pub total_bytes: u64,
    pub chunks_completed: u64,
    pub chunk_errors: u64,
    /// Percent complete, 0.0 to 100.0.
    pub percent: f64,
    pub elapsed: Duration,
    /// Average bytes per second since the session started.
    pub throughput: f64,
    /// Estimated seconds remaining. May be non-finite early on.
    pub eta_secs: f64,
}

impl ProgressSnapshot {
    /// ETA as a Duration, or `None` when it is not a finite non-negative value.
    pub fn eta(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.eta_secs).ok()
    }
}

/// Running totals for one upload session.
#[derive(Debug)]
pub struct ProgressTracker {
    total_bytes: u64,
    uploaded_bytes: u64,
    chunks_completed: u64,
    chunk_errors: u64,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64, started: Instant) -> Self {
        Self {
            total_bytes,
            uploaded_bytes: 0,
            chunks_completed: 0,
            chunk_errors: 0,
            started,
        }
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes
    }

    pub fn chunks_completed(&self) -> u64 {
        self.chunks_completed
    }

    pub fn chunk_errors(&self) -> u64 {
        self.chunk_errors
    }

    /// Record an acknowledged chunk.
    ///
    /// The acknowledged total never moves backwards and never exceeds the
    /// source size, so percent complete is monotonic.
    pub fn record_chunk(
        &mut self,
        _chunk: &ChunkSpan,
        total_uploaded: u64,
        now: Instant,
    ) -> ProgressSnapshot {
        self.chunks_completed += 1;
        self.uploaded_bytes = self
            .uploaded_bytes
            .max(total_uploaded)
            .min(self.total_bytes);
        self.snapshot(now)
    }

    /// Record a failed chunk attempt.
    pub fn record_error(&mut self) {
        self.chunk_errors += 1;
    }

    /// Mark every byte acknowledged. Called on the terminal success event.
    pub fn complete(&mut self, now: Instant) -> ProgressSnapshot {
        self.uploaded_bytes = self.total_bytes;
        self.snapshot(now)
    }

    pub fn snapshot(&self, now: Instant) -> ProgressSnapshot {
        let elapsed = now.saturating_duration_since(self.started);
        let uploaded = self.uploaded_bytes as f64;
        let total = self.total_bytes as f64;
        let percent = if self.total_bytes == 0 {
            100.0
        } else {
            uploaded / total * 100.0
        };
        let throughput = uploaded / elapsed.as_secs_f64();
        let eta_secs = (total - uploaded) / throughput;

        ProgressSnapshot {
            uploaded_bytes: self.uploaded_bytes,
            total_bytes: self.total_bytes,
            chunks_completed: self.chunks_completed,
            chunk_errors: self.chunk_errors,
            percent,
            elapsed,
            throughput,
            eta_secs,
        }
    }
}

/// Time gate for operator-visible reports.
///
/// The first check always passes; later checks pass only once `interval`
/// has elapsed since the last passing check.
#[derive(Debug)]
pub struct IntervalGate {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl IntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
        }
    }

    pub fn check(&mut self, now: Instant) -> bool {
        let open = match self.last_emit {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if open {
            self.last_emit = Some(now);
        }
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(id: u64, size: u64) -> ChunkSpan {
        ChunkSpan {
            id,
            offset: id * size,
            size,
        }
    }

    #[test]
    fn metrics_from_running_totals() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(1000, start);
        let snap = tracker.record_chunk(&span(0, 250), 250, start + Duration::from_secs(5));
        assert_eq!(snap.percent, 25.0);
        assert_eq!(snap.throughput, 50.0);
        assert_eq!(snap.eta_secs, 15.0);
        assert_eq!(snap.eta(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn zero_elapsed_gives_non_finite_metrics() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(1000, start);

        // Nothing acknowledged yet: 0 / 0
        let snap = tracker.snapshot(start);
        assert!(snap.throughput.is_nan());
        assert!(snap.eta_secs.is_nan());
        assert_eq!(snap.eta(), None);

        // Bytes acknowledged in zero time: infinite throughput
        let snap = tracker.record_chunk(&span(0, 100), 100, start);
        assert!(snap.throughput.is_infinite());
        assert_eq!(snap.eta_secs, 0.0);
        assert_eq!(snap.percent, 10.0);
    }

    #[test]
    fn percent_is_monotonic_and_ends_at_exactly_100() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(7_777, start);
        let mut last = 0.0;
        // Out-of-order cumulative totals never move the percentage backwards
        for (i, total) in [1000u64, 3000, 2000, 5000, 9000].into_iter().enumerate() {
            let now = start + Duration::from_millis(i as u64 * 10);
            let snap = tracker.record_chunk(&span(i as u64, 1000), total, now);
            assert!(snap.percent >= last);
            assert!(snap.percent <= 100.0);
            last = snap.percent;
        }
        let done = tracker.complete(start + Duration::from_secs(1));
        assert_eq!(done.percent, 100.0);
        assert_eq!(done.uploaded_bytes, 7_777);
    }

    #[test]
    fn empty_source_is_complete() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(0, start);
        assert_eq!(tracker.complete(start).percent, 100.0);
    }

    #[test]
    fn gate_first_check_passes() {
        let mut gate = IntervalGate::new(Duration::from_secs(5));
        let now = Instant::now();
        assert!(gate.check(now));
        assert!(!gate.check(now));
        assert!(!gate.check(now + Duration::from_millis(4999)));
        assert!(gate.check(now + Duration::from_millis(5000)));
    }

    #[test]
    fn gate_emissions_bounded_by_duration() {
        let interval = Duration::from_millis(5000);
        let start = Instant::now();
        for step_ms in [1u64, 7, 333, 4999, 5000, 12_000] {
            let mut gate = IntervalGate::new(interval);
            let duration_ms = 60_000u64;
            let mut emitted = 0u64;
            let mut t = 0;
            while t <= duration_ms {
                if gate.check(start + Duration::from_millis(t)) {
                    emitted += 1;
                }
                t += step_ms;
            }
            assert!(
                emitted <= duration_ms / 5000 + 1,
                "step {step_ms}ms emitted {emitted}"
            );
        }
    }
}
