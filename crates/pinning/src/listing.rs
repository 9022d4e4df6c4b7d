//! Paginated pin listing.

use crate::error::PinningResult;
use async_trait::async_trait;
use pinshift_core::PinRecord;

/// A single page of listing results.
#[derive(Clone, Debug, Default)]
pub struct ListingPage {
    /// Pin records in the order the service returned them.
    pub rows: Vec<PinRecord>,

    /// Total count reported by the service. Informational only; end of
    /// data is detected from a short page, so an inaccurate or missing
    /// count is tolerated.
    pub count: Option<u64>,
}

impl ListingPage {
    /// A page with fewer rows than the requested limit is the last one.
    pub fn is_last(&self, limit: u64) -> bool {
        (self.rows.len() as u64) < limit
    }
}

/// A paginated listing of currently-pinned records.
#[async_trait]
pub trait PinListing: Send + Sync {
    /// Fetch up to `limit` pinned records starting at `offset`.
    async fn list_page(&self, offset: u64, limit: u64) -> PinningResult<ListingPage>;
}

/// Page through `listing` and return every record in arrival order.
///
/// Pages are requested strictly one at a time with the offset advanced by
/// `page_limit` after each full page. The first short page ends the
/// listing; an empty first page yields an empty result. Any failed page
/// aborts the whole enumeration and no partial result is returned.
///
/// Records are not deduplicated. The result is a snapshot only if the
/// remote listing does not change between requests.
pub async fn fetch_all<L>(listing: &L, page_limit: u64) -> PinningResult<Vec<PinRecord>>
where
    L: PinListing + ?Sized,
{
    if page_limit == 0 {
        return Err(pinshift_core::Error::InvalidPageLimit(page_limit).into());
    }

    let mut offset = 0u64;
    let mut pins = Vec::new();

    loop {
        let page = listing.list_page(offset, page_limit).await?;
        let last = page.is_last(page_limit);
        pins.extend(page.rows);

        tracing::info!(
            offset,
            fetched = pins.len(),
            reported_total = ?page.count,
            "Fetched pin listing page"
        );

        if last {
            break;
        }
        offset += page_limit;
    }

    Ok(pins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PinningError;
    use std::sync::Mutex;

    /// Serves a fixed listing and records every requested offset.
    struct FixedListing {
        pins: Vec<PinRecord>,
        fail_at_offset: Option<u64>,
        offsets: Mutex<Vec<u64>>,
    }

    impl FixedListing {
        fn new(n: usize) -> Self {
            Self {
                pins: (0..n).map(|i| PinRecord::new(format!("cid-{i}"))).collect(),
                fail_at_offset: None,
                offsets: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<u64> {
            self.offsets.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PinListing for FixedListing {
        async fn list_page(&self, offset: u64, limit: u64) -> PinningResult<ListingPage> {
            self.offsets.lock().unwrap().push(offset);
            if self.fail_at_offset == Some(offset) {
                return Err(PinningError::Transport {
                    status: 502,
                    body: "bad gateway".to_string(),
                });
            }
            let start = (offset as usize).min(self.pins.len());
            let end = (start + limit as usize).min(self.pins.len());
            Ok(ListingPage {
                rows: self.pins[start..end].to_vec(),
                count: Some(self.pins.len() as u64),
            })
        }
    }

    #[tokio::test]
    async fn empty_listing_issues_one_request() {
        let listing = FixedListing::new(0);
        let pins = fetch_all(&listing, 1000).await.unwrap();
        assert!(pins.is_empty());
        assert_eq!(listing.requests(), vec![0]);
    }

    #[tokio::test]
    async fn request_count_is_floor_plus_one() {
        for (n, limit) in [(1usize, 10u64), (9, 10), (10, 10), (11, 10), (30, 10), (2247, 1000)] {
            let listing = FixedListing::new(n);
            let pins = fetch_all(&listing, limit).await.unwrap();
            assert_eq!(pins.len(), n);
            assert_eq!(listing.requests().len() as u64, n as u64 / limit + 1);
        }
    }

    #[tokio::test]
    async fn offsets_advance_by_page_limit_in_order() {
        let listing = FixedListing::new(25);
        let pins = fetch_all(&listing, 10).await.unwrap();
        assert_eq!(listing.requests(), vec![0, 10, 20]);
        let expected: Vec<_> = (0..25).map(|i| PinRecord::new(format!("cid-{i}"))).collect();
        assert_eq!(pins, expected);
    }

    #[tokio::test]
    async fn failure_on_later_page_discards_partial_result() {
        let mut listing = FixedListing::new(35);
        listing.fail_at_offset = Some(20);
        let err = fetch_all(&listing, 10).await.unwrap_err();
        match err {
            PinningError::Transport { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(listing.requests(), vec![0, 10, 20]);
    }

    #[tokio::test]
    async fn zero_page_limit_rejected() {
        let listing = FixedListing::new(5);
        assert!(matches!(
            fetch_all(&listing, 0).await,
            Err(PinningError::Core(_))
        ));
        assert!(listing.requests().is_empty());
    }
}
