use async_trait::async_trait;
use pinshift_core::{AtomicAmount, ChunkPlan, ChunkSpan};
use pinshift_transfer::{
    ChunkedTransfer, EventSender, Funding, FundingError, ProgressSink, ProgressSnapshot,
    TransferError, TransferEvent, UploadSource,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory transfer client that acknowledges chunks in order.
#[allow(dead_code)]
#[derive(Clone)]
pub struct MemoryTransfer {
    pub chunk_size: u64,
    pub concurrency: usize,
    /// Report one failed attempt for this chunk before acknowledging it.
    pub flaky_chunk: Option<u64>,
    /// Fail the whole transfer after this many chunks.
    pub fail_after: Option<u64>,
    pub event_tx_id: Option<String>,
    pub returned_tx_id: String,
    pub started: Arc<AtomicBool>,
    pub received: Arc<Mutex<Vec<(ChunkSpan, Vec<u8>)>>>,
}

#[allow(dead_code)]
impl MemoryTransfer {
    pub fn new(chunk_size: u64, concurrency: usize) -> Self {
        Self {
            chunk_size,
            concurrency,
            flaky_chunk: None,
            fail_after: None,
            event_tx_id: Some("tx-memory".to_string()),
            returned_tx_id: "tx-memory".to_string(),
            started: Arc::new(AtomicBool::new(false)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn was_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn chunks(&self) -> Vec<ChunkSpan> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|(span, _)| *span)
            .collect()
    }
}

#[async_trait]
impl ChunkedTransfer for MemoryTransfer {
    fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    async fn transfer(
        &self,
        mut source: UploadSource,
        events: EventSender,
    ) -> Result<String, TransferError> {
        self.started.store(true, Ordering::SeqCst);
        let plan = ChunkPlan::new(source.total_size(), self.chunk_size)
            .map_err(|e| TransferError::Config(e.to_string()))?;
        let mut uploaded = 0;

        for chunk in plan.spans() {
            if self.fail_after == Some(chunk.id) {
                return Err(TransferError::Transport {
                    status: 500,
                    body: "node unavailable".to_string(),
                });
            }
            let data = source.read_span(&chunk).await?;
            if self.flaky_chunk == Some(chunk.id) {
                let _ = events
                    .send(TransferEvent::ChunkFailed {
                        chunk,
                        attempt: 0,
                        error: "503 Service Unavailable".to_string(),
                    })
                    .await;
            }
            self.received.lock().unwrap().push((chunk, data.to_vec()));
            uploaded += chunk.size;
            let _ = events
                .send(TransferEvent::ChunkUploaded {
                    chunk,
                    total_uploaded: uploaded,
                })
                .await;
        }

        if let Some(transaction_id) = self.event_tx_id.clone() {
            let _ = events.send(TransferEvent::Done { transaction_id }).await;
        }
        Ok(self.returned_tx_id.clone())
    }
}

/// Funding with a fixed balance and a fixed total price.
#[allow(dead_code)]
pub struct FixedFunding {
    pub balance: u128,
    pub price: u128,
}

#[async_trait]
impl Funding for FixedFunding {
    async fn balance(&self) -> Result<AtomicAmount, FundingError> {
        Ok(AtomicAmount::new(self.balance))
    }

    async fn price(&self, _bytes: u64) -> Result<AtomicAmount, FundingError> {
        Ok(AtomicAmount::new(self.price))
    }
}

/// Records every report the coordinator makes.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub percents: Arc<Mutex<Vec<f64>>>,
    pub retries: Arc<Mutex<Vec<u64>>>,
    pub completed: Arc<Mutex<Vec<(String, f64)>>>,
}

impl ProgressSink for RecordingSink {
    fn progress(&mut self, snapshot: &ProgressSnapshot, _visible: bool) {
        self.percents.lock().unwrap().push(snapshot.percent);
    }

    fn chunk_failed(&mut self, chunk: &ChunkSpan, _attempt: u32, _error: &str) {
        self.retries.lock().unwrap().push(chunk.id);
    }

    fn completed(&mut self, snapshot: &ProgressSnapshot, transaction_id: &str) {
        self.completed
            .lock()
            .unwrap()
            .push((transaction_id.to_string(), snapshot.percent));
    }
}
