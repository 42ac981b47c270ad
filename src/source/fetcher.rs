//! HTTP seam for page retrieval.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::config::HttpConfig;
use crate::source::error::FetchError;
use crate::source::types::ApiPage;

/// Performs a single GET for a fully built page URL. No retries here.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<ApiPage, FetchError>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Permanent(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<ApiPage, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = %status, "Non-success status");
            return Err(FetchError::from_status(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| FetchError::Permanent(format!("malformed page body: {}", e)))
    }
}
