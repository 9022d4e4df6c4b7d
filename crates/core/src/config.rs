//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pinning service used for pin exports.
    #[serde(default)]
    pub pinning: PinningConfig,
    /// Storage node used for backup uploads.
    #[serde(default)]
    pub node: NodeConfig,
    /// Chunked upload tuning.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Directory for exported pin listings.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory for the append-only log file. No file log when unset.
    pub log_dir: Option<PathBuf>,
}

/// Pinning service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PinningConfig {
    /// API base URL.
    #[serde(default = "default_pinning_api_url")]
    pub api_url: String,
    /// Bearer token.
    /// WARNING: Prefer PINSHIFT_PINNING__JWT over storing in config.
    pub jwt: Option<String>,
    /// Records requested per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: u64,
}

/// Storage node configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node base URL.
    #[serde(default = "default_node_url")]
    pub url: String,
    /// Currency the node is funded in (path segment of node endpoints).
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Funded wallet address, used for balance queries.
    pub address: Option<String>,
    /// Optional bearer token for the node.
    /// WARNING: Prefer PINSHIFT_NODE__TOKEN over storing in config.
    pub token: Option<String>,
    /// Decimal places of the currency, used only for display.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

/// Chunked upload configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Maximum chunks in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Minimum interval between operator-visible progress reports.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
    /// Retries per chunk before the upload fails.
    #[serde(default = "default_max_chunk_retries")]
    pub max_chunk_retries: u32,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./exports")
}

fn default_pinning_api_url() -> String {
    "https://api.pinata.cloud".to_string()
}

fn default_page_limit() -> u64 {
    crate::DEFAULT_PAGE_LIMIT
}

fn default_node_url() -> String {
    "https://node1.bundlr.network".to_string()
}

fn default_currency() -> String {
    "arweave".to_string()
}

fn default_decimals() -> u32 {
    12 // winston per AR
}

fn default_chunk_size() -> u64 {
    crate::DEFAULT_CHUNK_SIZE
}

fn default_concurrency() -> usize {
    crate::DEFAULT_CONCURRENCY
}

fn default_report_interval_ms() -> u64 {
    crate::DEFAULT_REPORT_INTERVAL_MS
}

fn default_max_chunk_retries() -> u32 {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pinning: PinningConfig::default(),
            node: NodeConfig::default(),
            upload: UploadConfig::default(),
            output_dir: default_output_dir(),
            log_dir: None,
        }
    }
}

impl Default for PinningConfig {
    fn default() -> Self {
        Self {
            api_url: default_pinning_api_url(),
            jwt: None,
            page_limit: default_page_limit(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: default_node_url(),
            currency: default_currency(),
            address: None,
            token: None,
            decimals: default_decimals(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            concurrency: default_concurrency(),
            report_interval_ms: default_report_interval_ms(),
            max_chunk_retries: default_max_chunk_retries(),
        }
    }
}

impl UploadConfig {
    /// Get the report interval as a Duration.
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

impl AppConfig {
    /// Validate the configuration.
    ///
    /// Returns warnings for settings that are unusual but allowed,
    /// and an error for settings the uploader or enumerator cannot run with.
    pub fn validate(&self) -> crate::Result<Vec<String>> {
        let mut warnings = Vec::new();

        if self.upload.chunk_size == 0 {
            return Err(crate::Error::InvalidChunkSize(0));
        }
        if self.upload.concurrency == 0 {
            return Err(crate::Error::InvalidConcurrency(0));
        }
        if self.pinning.page_limit == 0 {
            return Err(crate::Error::InvalidPageLimit(0));
        }
        if self.node.decimals > 38 {
            return Err(crate::Error::Config(format!(
                "node.decimals {} exceeds maximum 38",
                self.node.decimals
            )));
        }

        if self.upload.report_interval_ms == 0 {
            warnings.push(
                "upload.report_interval_ms is 0: every progress event will be reported".to_string(),
            );
        }
        if self.upload.concurrency > 32 {
            warnings.push(format!(
                "upload.concurrency {} is high; each in-flight chunk holds {} bytes in memory",
                self.upload.concurrency, self.upload.chunk_size
            ));
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_configuration() {
        let config = AppConfig::default();
        assert_eq!(config.upload.chunk_size, 25_000_000);
        assert_eq!(config.upload.concurrency, 5);
        assert_eq!(config.upload.report_interval(), Duration::from_secs(5));
        assert_eq!(config.pinning.page_limit, 1000);
        assert_eq!(config.node.currency, "arweave");
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut config = AppConfig::default();
        config.upload.concurrency = 0;
        assert!(matches!(
            config.validate(),
            Err(crate::Error::InvalidConcurrency(0))
        ));
    }

    #[test]
    fn rejects_zero_page_limit() {
        let mut config = AppConfig::default();
        config.pinning.page_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn warns_on_zero_report_interval() {
        let mut config = AppConfig::default();
        config.upload.report_interval_ms = 0;
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"upload": {"concurrency": 2}, "log_dir": "/tmp/logs"}"#)
                .unwrap();
        assert_eq!(config.upload.concurrency, 2);
        assert_eq!(config.upload.chunk_size, 25_000_000);
        assert_eq!(config.output_dir, PathBuf::from("./exports"));
    }
}
