//! HTTP clients for a bundler node's chunked upload and funding endpoints.

use crate::error::{FundingError, TransferError};
use crate::funding::Funding;
use crate::transfer::{ChunkedTransfer, EventSender, TransferEvent, UploadSource};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use pinshift_core::{AtomicAmount, ChunkPlan, ChunkSpan};
use reqwest::Url;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

fn parse_base_url(url: &str) -> Result<Url, String> {
    Url::parse(&pinshift_core::endpoint::with_trailing_slash(url)).map_err(|e| format!("{url}: {e}"))
}

/// Chunked upload client for a bundler node.
///
/// Built once through [`NodeUploader::builder`]; chunk size, concurrency,
/// and retry policy are fixed at build time.
#[derive(Clone, Debug)]
pub struct NodeUploader {
    http: reqwest::Client,
    base_url: Url,
    currency: String,
    token: Option<String>,
    chunk_size: u64,
    concurrency: usize,
    max_retries: u32,
    retry_delay: Duration,
}

/// Builder for [`NodeUploader`].
#[derive(Debug)]
pub struct NodeUploaderBuilder {
    http: Option<reqwest::Client>,
    base_url: String,
    currency: String,
    token: Option<String>,
    chunk_size: u64,
    concurrency: usize,
    max_retries: u32,
    retry_delay: Duration,
}

impl NodeUploaderBuilder {
    pub fn http(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Retries per chunk after the first attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base backoff delay; doubles after each failed attempt.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn build(self) -> Result<NodeUploader, TransferError> {
        if self.chunk_size == 0 {
            return Err(TransferError::Config("chunk size must be positive".into()));
        }
        if self.concurrency == 0 {
            return Err(TransferError::Config("concurrency must be positive".into()));
        }
        let base_url = parse_base_url(&self.base_url).map_err(TransferError::InvalidUrl)?;
        Ok(NodeUploader {
            http: self.http.unwrap_or_default(),
            base_url,
            currency: self.currency,
            token: self.token,
            chunk_size: self.chunk_size,
            concurrency: self.concurrency,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
        })
    }
}

impl NodeUploader {
    pub fn builder(base_url: &str, currency: &str) -> NodeUploaderBuilder {
        NodeUploaderBuilder {
            http: None,
            base_url: base_url.to_string(),
            currency: currency.to_string(),
            token: None,
            chunk_size: pinshift_core::DEFAULT_CHUNK_SIZE,
            concurrency: pinshift_core::DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    fn url(&self, path: &str) -> Result<Url, TransferError> {
        self.base_url
            .join(path)
            .map_err(|e| TransferError::InvalidUrl(format!("{path}: {e}")))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, TransferError> {
        let response = self.authorize(req).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Transport {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Open a chunked upload and check the node accepts our chunk size.
    async fn create_upload(&self) -> Result<String, TransferError> {
        let url = self.url(&format!("chunks/{}/-1/-1", self.currency))?;
        let created: CreateChunkedResponse = self.send_json(self.http.get(url)).await?;

        if let (Some(min), Some(max)) = (created.min, created.max)
            && !(min..=max).contains(&self.chunk_size)
        {
            return Err(TransferError::ChunkSizeRejected {
                size: self.chunk_size,
                min,
                max,
            });
        }

        Ok(created.id)
    }

    async fn finalize_upload(&self, upload_id: &str) -> Result<String, TransferError> {
        let url = self.url(&format!("chunks/{}/{}/-1", self.currency, upload_id))?;
        let finished: FinishChunkedResponse = self.send_json(self.http.post(url)).await?;
        Ok(finished.id)
    }

    /// Upload one chunk, retrying transport errors and 5xx responses with
    /// exponential backoff. A 4xx response fails the chunk immediately.
    ///
    /// Each failed attempt that will be retried is reported on `events`.
    /// The last failure is returned instead.
    async fn upload_chunk(
        &self,
        upload_id: &str,
        chunk: ChunkSpan,
        data: Bytes,
        events: &EventSender,
    ) -> Result<ChunkSpan, TransferError> {
        let url = self.url(&format!(
            "chunks/{}/{}/{}",
            self.currency, upload_id, chunk.offset
        ))?;
        let mut attempt = 0;

        loop {
            let detail = match self
                .authorize(
                    self.http
                        .post(url.clone())
                        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                        .body(data.clone()),
                )
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return Ok(chunk),
                Ok(response) if response.status().is_server_error() => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    format!("{status}: {body}")
                }
                // Client errors won't resolve with retries.
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(TransferError::ChunkFailed {
                        chunk_id: chunk.id,
                        attempts: attempt + 1,
                        detail: format!("{status}: {body}"),
                    });
                }
                Err(e) => e.to_string(),
            };

            if attempt >= self.max_retries {
                return Err(TransferError::ChunkFailed {
                    chunk_id: chunk.id,
                    attempts: attempt + 1,
                    detail,
                });
            }

            let _ = events
                .send(TransferEvent::ChunkFailed {
                    chunk,
                    attempt,
                    error: detail,
                })
                .await;

            attempt += 1;
            let delay = self.retry_delay * (1 << (attempt - 1).min(16)); // 1s, 2s, 4s
            tokio::time::sleep(delay).await;
        }
    }
}

/// Read every span of `plan` in order and run `upload` on it, keeping at
/// most `concurrency` chunks in flight. Acknowledged chunks are reported on
/// `events` with the running total, which is returned.
async fn upload_spans<F, Fut>(
    source: &mut UploadSource,
    plan: &ChunkPlan,
    concurrency: usize,
    events: &EventSender,
    mut upload: F,
) -> Result<u64, TransferError>
where
    F: FnMut(ChunkSpan, Bytes) -> Fut,
    Fut: Future<Output = Result<ChunkSpan, TransferError>>,
{
    let mut in_flight = FuturesUnordered::new();
    let mut uploaded = 0u64;

    for chunk in plan.spans() {
        let data = source.read_span(&chunk).await?;
        in_flight.push(upload(chunk, data));

        if in_flight.len() >= concurrency
            && let Some(result) = in_flight.next().await
        {
            let done = result?;
            uploaded += done.size;
            let _ = events
                .send(TransferEvent::ChunkUploaded {
                    chunk: done,
                    total_uploaded: uploaded,
                })
                .await;
        }
    }

    while let Some(result) = in_flight.next().await {
        let done = result?;
        uploaded += done.size;
        let _ = events
            .send(TransferEvent::ChunkUploaded {
                chunk: done,
                total_uploaded: uploaded,
            })
            .await;
    }

    Ok(uploaded)
}

#[async_trait]
impl ChunkedTransfer for NodeUploader {
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
        let plan = ChunkPlan::new(source.total_size(), self.chunk_size)
            .map_err(|e| TransferError::Config(e.to_string()))?;
        let upload_id = self.create_upload().await?;
        tracing::debug!(upload_id = %upload_id, chunks = plan.chunk_count(), "Chunked upload opened");

        let this = self;
        let upload_id = upload_id.as_str();
        let events_ref = &events;
        upload_spans(
            &mut source,
            &plan,
            self.concurrency,
            &events,
            move |chunk, data| this.upload_chunk(upload_id, chunk, data, events_ref),
        )
        .await?;

        let transaction_id = self.finalize_upload(upload_id).await?;
        let _ = events
            .send(TransferEvent::Done {
                transaction_id: transaction_id.clone(),
            })
            .await;

        Ok(transaction_id)
    }
}

/// Balance and price queries against a bundler node.
#[derive(Clone, Debug)]
pub struct NodeFunding {
    http: reqwest::Client,
    base_url: Url,
    currency: String,
    address: Option<String>,
}

impl NodeFunding {
    pub fn new(base_url: &str, currency: &str, address: Option<String>) -> Result<Self, FundingError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: parse_base_url(base_url).map_err(FundingError::InvalidUrl)?,
            currency: currency.to_string(),
            address,
        })
    }

    fn url(&self, path: &str) -> Result<Url, FundingError> {
        self.base_url
            .join(path)
            .map_err(|e| FundingError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn get_text(&self, url: Url) -> Result<String, FundingError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FundingError::Transport {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Parse an atomic amount from a JSON number or a (possibly quoted) string.
fn parse_amount(value: &serde_json::Value) -> Result<AtomicAmount, FundingError> {
    let raw = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        other => return Err(FundingError::Decode(format!("unexpected amount: {other}"))),
    };
    raw.parse()
        .map_err(|e: pinshift_core::Error| FundingError::Decode(e.to_string()))
}

#[async_trait]
impl Funding for NodeFunding {
    async fn balance(&self) -> Result<AtomicAmount, FundingError> {
        let address = self.address.as_deref().ok_or(FundingError::MissingAddress)?;
        let mut url = self.url(&format!("account/balance/{}", self.currency))?;
        url.query_pairs_mut().append_pair("address", address);

        let body = self.get_text(url).await?;
        let response: BalanceResponse =
            serde_json::from_str(&body).map_err(|e| FundingError::Decode(e.to_string()))?;
        parse_amount(&response.balance)
    }

    async fn price(&self, bytes: u64) -> Result<AtomicAmount, FundingError> {
        let url = self.url(&format!("price/{}/{}", self.currency, bytes))?;
        let body = self.get_text(url).await?;
        // Large prices must not pass through f64, so parse the raw text.
        body.trim()
            .parse()
            .map_err(|e: pinshift_core::Error| FundingError::Decode(e.to_string()))
    }
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateChunkedResponse {
    id: String,
    #[serde(default)]
    min: Option<u64>,
    #[serde(default)]
    max: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FinishChunkedResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    #[test]
    fn builder_rejects_zero_concurrency() {
        let err = NodeUploader::builder("http://localhost:1", "arweave")
            .concurrency(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, TransferError::Config(_)));
    }

    #[test]
    fn builder_fixes_configuration() {
        let uploader = NodeUploader::builder("http://localhost:1/base", "arweave")
            .chunk_size(1024)
            .concurrency(2)
            .build()
            .unwrap();
        assert_eq!(uploader.chunk_size(), 1024);
        assert_eq!(uploader.concurrency(), 2);
        assert_eq!(
            uploader.url("chunks/arweave/-1/-1").unwrap().as_str(),
            "http://localhost:1/base/chunks/arweave/-1/-1"
        );
    }

    async fn peak_in_flight(chunks: u64, concurrency: usize) -> (usize, u64) {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut source = UploadSource::from_bytes(vec![0u8; (chunks * 4) as usize]);
        let plan = ChunkPlan::new(source.total_size(), 4).unwrap();
        let (tx, _rx) = mpsc::channel(64);

        let uploaded = upload_spans(&mut source, &plan, concurrency, &tx, |chunk, _data| {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10 * (chunk.id % 3 + 1))).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(chunk)
            }
        })
        .await
        .unwrap();

        (peak.load(Ordering::SeqCst), uploaded)
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_chunks_never_exceed_concurrency() {
        let (peak, uploaded) = peak_in_flight(9, 3).await;
        assert_eq!(peak, 3);
        assert_eq!(uploaded, 36);

        let (peak, _) = peak_in_flight(2, 5).await;
        assert_eq!(peak, 2);

        let (peak, _) = peak_in_flight(4, 1).await;
        assert_eq!(peak, 1);
    }

    #[test]
    fn amounts_parse_from_strings_and_numbers() {
        assert_eq!(
            parse_amount(&serde_json::json!("1000000000000000000000")).unwrap(),
            AtomicAmount::new(1_000_000_000_000_000_000_000)
        );
        assert_eq!(
            parse_amount(&serde_json::json!(150)).unwrap(),
            AtomicAmount::new(150)
        );
        assert!(parse_amount(&serde_json::json!(1.5)).is_err());
        assert!(parse_amount(&serde_json::json!(null)).is_err());
    }
}
