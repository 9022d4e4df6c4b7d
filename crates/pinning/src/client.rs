use crate::error::{PinningError, PinningResult};
use crate::listing::{ListingPage, PinListing};
use async_trait::async_trait;
use pinshift_core::PinRecord;
use pinshift_core::endpoint::with_trailing_slash;
use reqwest::Url;
use serde::Deserialize;

/// HTTP client for the pinning service listing API.
#[derive(Clone)]
pub struct PinningClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl PinningClient {
    pub fn new(base_url: &str, token: &str) -> PinningResult<Self> {
        Self::with_http(reqwest::Client::new(), base_url, token)
    }

    pub fn with_http(http: reqwest::Client, base_url: &str, token: &str) -> PinningResult<Self> {
        let base_url = Url::parse(&with_trailing_slash(base_url))
            .map_err(|e| PinningError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            http,
            base_url,
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> PinningResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PinningError::InvalidUrl(format!("{path}: {e}")))
    }
}

#[async_trait]
impl PinListing for PinningClient {
    async fn list_page(&self, offset: u64, limit: u64) -> PinningResult<ListingPage> {
        let mut url = self.url("data/pinList")?;
        url.query_pairs_mut()
            .append_pair("status", "pinned")
            .append_pair("pageLimit", &limit.to_string())
            .append_pair("pageOffset", &offset.to_string());

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PinningError::Transport {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let body = response.text().await?;

        let listing: PinListResponse = serde_json::from_str(&body)?;
        Ok(ListingPage {
            rows: listing
                .rows
                .into_iter()
                .map(|row| PinRecord::new(row.ipfs_pin_hash))
                .collect(),
            count: listing.count,
        })
    }
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct PinListResponse {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    rows: Vec<PinRow>,
}

#[derive(Debug, Deserialize)]
struct PinRow {
    ipfs_pin_hash: String,
}
