//! Pre-flight funding checks.

use crate::error::FundingError;
use async_trait::async_trait;
use pinshift_core::AtomicAmount;

/// Balance and price queries against the destination node.
#[async_trait]
pub trait Funding: Send + Sync {
    /// Pre-funded balance available for uploads.
    async fn balance(&self) -> Result<AtomicAmount, FundingError>;

    /// Quoted price for storing `bytes` bytes.
    async fn price(&self, bytes: u64) -> Result<AtomicAmount, FundingError>;
}

/// Price and balance observed for one upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FundingQuote {
    pub bytes: u64,
    pub price: AtomicAmount,
    pub balance: AtomicAmount,
}

impl FundingQuote {
    /// Amount still needed, or `None` when the balance covers the price.
    pub fn deficit(&self) -> Option<AtomicAmount> {
        self.balance.deficit_for(self.price)
    }

    pub fn is_covered(&self) -> bool {
        self.deficit().is_none()
    }
}

/// Query price and balance for an upload of `bytes` bytes.
pub async fn quote<F>(funding: &F, bytes: u64) -> Result<FundingQuote, FundingError>
where
    F: Funding + ?Sized,
{
    let price = funding.price(bytes).await?;
    let balance = funding.balance().await?;
    Ok(FundingQuote {
        bytes,
        price,
        balance,
    })
}
