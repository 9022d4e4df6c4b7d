//! Chunked-transfer client abstraction.

use crate::error::TransferError;
use async_trait::async_trait;
use bytes::Bytes;
use pinshift_core::ChunkSpan;
use std::path::Path;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

/// Chunk lifecycle events emitted by a transfer client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferEvent {
    /// A chunk was acknowledged by the node.
    ChunkUploaded {
        chunk: ChunkSpan,
        /// Cumulative bytes acknowledged so far, this chunk included.
        total_uploaded: u64,
    },
    /// One attempt at a chunk failed. The client retries it.
    ChunkFailed {
        chunk: ChunkSpan,
        attempt: u32,
        error: String,
    },
    /// Every chunk landed and the upload was finalized.
    Done { transaction_id: String },
}

/// Sending half of the event channel handed to a transfer client.
pub type EventSender = mpsc::Sender<TransferEvent>;

/// A byte source of known total size.
pub struct UploadSource {
    reader: Pin<Box<dyn AsyncRead + Send>>,
    total_size: u64,
}

impl UploadSource {
    pub fn new(reader: impl AsyncRead + Send + 'static, total_size: u64) -> Self {
        Self {
            reader: Box::pin(reader),
            total_size,
        }
    }

    /// Open a local file, taking its size from metadata.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        let total_size = file.metadata().await?.len();
        Ok(Self::new(file, total_size))
    }

    /// An in-memory source.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let total_size = data.len() as u64;
        Self::new(std::io::Cursor::new(data), total_size)
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Read exactly the bytes of `span`. Spans must be read in offset order.
    pub async fn read_span(&mut self, span: &ChunkSpan) -> std::io::Result<Bytes> {
        let size = usize::try_from(span.size).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "chunk size exceeds platform limits",
            )
        })?;
        let mut data = vec![0u8; size];
        self.reader.read_exact(&mut data).await?;
        Ok(Bytes::from(data))
    }
}

impl std::fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSource")
            .field("total_size", &self.total_size)
            .finish_non_exhaustive()
    }
}

/// A configured chunked-transfer client.
///
/// Chunk size and concurrency are fixed when the client is built and
/// cannot change for the lifetime of the handle.
#[async_trait]
pub trait ChunkedTransfer: Send + Sync {
    /// Chunk size in bytes.
    fn chunk_size(&self) -> u64;

    /// Maximum chunks in flight at once.
    fn concurrency(&self) -> usize;

    /// Upload `source`, reporting chunk events on `events`.
    ///
    /// On success the client has sent `TransferEvent::Done` and returns the
    /// same transaction id. A returned error is fatal for the session.
    async fn transfer(
        &self,
        source: UploadSource,
        events: EventSender,
    ) -> Result<String, TransferError>;
}
