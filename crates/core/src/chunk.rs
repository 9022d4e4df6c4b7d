//! Chunk planning for chunked uploads.

use serde::{Deserialize, Serialize};

/// A contiguous byte range of the source stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpan {
    /// Position in the upload (0-indexed).
    pub id: u64,
    /// Byte offset within the source.
    pub offset: u64,
    /// Size in bytes.
    pub size: u64,
}

impl ChunkSpan {
    /// Offset one past the last byte of this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Splits a source of known size into fixed-size chunks.
///
/// Every chunk is `chunk_size` bytes except possibly the last, which holds
/// the remainder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    total_size: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    /// Create a plan, rejecting a zero chunk size.
    pub fn new(total_size: u64, chunk_size: u64) -> crate::Result<Self> {
        if chunk_size == 0 {
            return Err(crate::Error::InvalidChunkSize(chunk_size));
        }
        Ok(Self {
            total_size,
            chunk_size,
        })
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Number of chunks: `ceil(total / chunk_size)`.
    pub fn chunk_count(&self) -> u64 {
        self.total_size.div_ceil(self.chunk_size)
    }

    /// Size of the final chunk, or `None` for an empty source.
    pub fn final_chunk_size(&self) -> Option<u64> {
        if self.total_size == 0 {
            return None;
        }
        match self.total_size % self.chunk_size {
            0 => Some(self.chunk_size),
            rem => Some(rem),
        }
    }

    /// The span for chunk `id`, if it exists.
    pub fn span(&self, id: u64) -> Option<ChunkSpan> {
        let offset = id.checked_mul(self.chunk_size)?;
        if offset >= self.total_size {
            return None;
        }
        let size = std::cmp::min(self.chunk_size, self.total_size - offset);
        Some(ChunkSpan { id, offset, size })
    }

    /// Iterate over all spans in offset order.
    pub fn spans(&self) -> impl Iterator<Item = ChunkSpan> + '_ {
        (0..self.chunk_count()).filter_map(|id| self.span(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_plan_splitting() {
        let plan = ChunkPlan::new(100, 30).unwrap();
        let spans: Vec<_> = plan.spans().collect();
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].size, 30);
        assert_eq!(spans[3].offset, 90);
        assert_eq!(spans[3].size, 10); // Last chunk is smaller
        assert_eq!(plan.final_chunk_size(), Some(10));
    }

    #[test]
    fn test_exact_multiple_has_full_final_chunk() {
        let plan = ChunkPlan::new(90, 30).unwrap();
        assert_eq!(plan.chunk_count(), 3);
        assert_eq!(plan.final_chunk_size(), Some(30));
    }

    #[test]
    fn test_spans_cover_source() {
        for (total, chunk) in [(1u64, 1u64), (7, 3), (1_000_003, 4096), (25_000_000, 25_000_000)] {
            let plan = ChunkPlan::new(total, chunk).unwrap();
            let spans: Vec<_> = plan.spans().collect();
            assert_eq!(spans.len() as u64, total.div_ceil(chunk));
            assert_eq!(spans.iter().map(|s| s.size).sum::<u64>(), total);
            for pair in spans.windows(2) {
                assert_eq!(pair[0].end(), pair[1].offset);
            }
        }
    }

    #[test]
    fn test_small_source_single_chunk() {
        let plan = ChunkPlan::new(5_000_000, 25_000_000).unwrap();
        let spans: Vec<_> = plan.spans().collect();
        assert_eq!(
            spans,
            vec![ChunkSpan {
                id: 0,
                offset: 0,
                size: 5_000_000
            }]
        );
    }

    #[test]
    fn test_empty_source() {
        let plan = ChunkPlan::new(0, 10).unwrap();
        assert_eq!(plan.chunk_count(), 0);
        assert_eq!(plan.final_chunk_size(), None);
        assert!(plan.spans().next().is_none());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            ChunkPlan::new(10, 0),
            Err(crate::Error::InvalidChunkSize(0))
        ));
    }
}
