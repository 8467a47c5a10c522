//! Authenticated JSON client shared by platform connectors
//!
//! Wraps `reqwest` with a request timeout, bearer authentication and bounded
//! retries with exponential backoff for transient failures.

pub mod pagination;

pub use pagination::{fetch_all_pages, resolve_against_base, Page};

use crate::credential::Credential;
use crate::error::{IngestError, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

// ============================================================================
// HTTP Client Constants
// ============================================================================

/// Default request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default number of retries after the first attempt.
pub const DEFAULT_HTTP_MAX_RETRIES: u32 = 2;

/// Default base delay between retries in milliseconds.
pub const DEFAULT_HTTP_RETRY_BACKOFF_MS: u64 = 500;

/// Default upper bound on pages followed for a single endpoint.
pub const DEFAULT_HTTP_MAX_PAGES: usize = 10_000;

/// Default user agent sent to platform APIs.
pub const DEFAULT_USER_AGENT: &str = concat!("dashsync-ingest/", env!("CARGO_PKG_VERSION"));

/// HTTP behaviour for platform clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,

    /// Base backoff; attempt `n` waits `retry_backoff_ms * 2^(n-1)`
    pub retry_backoff_ms: u64,

    /// User agent header
    pub user_agent: String,

    /// Maximum pages followed per endpoint
    pub max_pages: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_retries: DEFAULT_HTTP_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_HTTP_RETRY_BACKOFF_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_pages: DEFAULT_HTTP_MAX_PAGES,
        }
    }
}

impl HttpConfig {
    /// Load from `DASHSYNC_HTTP_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout_secs: env_parse("DASHSYNC_HTTP_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            max_retries: env_parse("DASHSYNC_HTTP_MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_backoff_ms: env_parse("DASHSYNC_HTTP_RETRY_BACKOFF_MS")
                .unwrap_or(defaults.retry_backoff_ms),
            user_agent: std::env::var("DASHSYNC_HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            max_pages: env_parse("DASHSYNC_HTTP_MAX_PAGES").unwrap_or(defaults.max_pages),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(IngestError::Config(
                "DASHSYNC_HTTP_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(IngestError::Config(
                "DASHSYNC_HTTP_MAX_PAGES must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Bearer-authenticated JSON client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: HttpConfig,
}

impl ApiClient {
    pub fn new(config: HttpConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// GET `url` and decode the JSON body, retrying transient failures
    ///
    /// `endpoint` is a human-readable label used in errors and logs.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &Url,
        credential: &Credential,
    ) -> Result<T> {
        let mut attempt = 0;

        loop {
            match self.get_once(endpoint, url, credential).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.backoff(attempt);
                    warn!(
                        endpoint,
                        attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "Request failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(e) => {
                    if attempt > 0 {
                        info!(endpoint, attempts = attempt + 1, "Giving up after retries");
                    }
                    return Err(e);
                },
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &Url,
        credential: &Credential,
    ) -> Result<T> {
        debug!(endpoint, %url, "GET");

        let response = self
            .client
            .get(url.clone())
            .header(header::AUTHORIZATION, credential.bearer())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Upstream {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| IngestError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 2);
        assert!(config.user_agent.starts_with("dashsync-ingest/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backoff_doubles() {
        let config = HttpConfig {
            retry_backoff_ms: 100,
            ..HttpConfig::default()
        };
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = HttpConfig {
            timeout_secs: 0,
            ..HttpConfig::default()
        };
        assert!(ApiClient::new(config).is_err());
    }
}
