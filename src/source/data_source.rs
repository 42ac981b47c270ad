//! Paginated data source.
//!
//! Turns a [`PageRequest`] into one logical fetch against an endpoint and
//! folds every outcome into a [`PageResult`]. Errors stop here.

use std::sync::Arc;

use crate::config::{EndpointConfig, FetchConfig, TotalCountMode};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::source::endpoint::build_page_url;
use crate::source::error::FetchError;
use crate::source::fetcher::{HttpFetcher, PageFetcher};
use crate::source::types::{ApiPage, PageRequest, PageResult, TotalCount};

/// Cheap to clone; clones share the underlying fetcher.
#[derive(Clone)]
pub struct DataSource {
    fetcher: Arc<dyn PageFetcher>,
    retry: RetryPolicy,
}

impl DataSource {
    pub fn new(fetcher: Arc<dyn PageFetcher>, retry: RetryPolicy) -> Self {
        Self { fetcher, retry }
    }

    /// HTTP source with the configured client and retry settings.
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(&config.http)?;
        Ok(Self::new(Arc::new(fetcher), RetryPolicy::from_config(&config.retries)))
    }

    /// Policy applied to endpoints with `retry = true`.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch one page. Never fails; see [`PageResult::unavailable`].
    pub async fn fetch_page(&self, endpoint: &EndpointConfig, request: &PageRequest) -> PageResult {
        tracing::debug!(
            endpoint = %endpoint.name,
            page = request.page_index,
            sort = %request.sort_field,
            direction = %request.sort_direction,
            "Fetching page"
        );

        match self.try_fetch(endpoint, request).await {
            Ok(page) => {
                let result = normalize(endpoint, page);
                tracing::debug!(
                    endpoint = %endpoint.name,
                    page = request.page_index,
                    rows = result.items.len(),
                    total = result.total_count.value(),
                    "Page loaded"
                );
                metrics::record_request(&endpoint.name, true);
                result
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %endpoint.name,
                    page = request.page_index,
                    kind = e.kind(),
                    error = %e,
                    "Page unavailable"
                );
                metrics::record_request(&endpoint.name, false);
                metrics::record_failure(&endpoint.name, e.kind());
                PageResult::unavailable()
            }
        }
    }

    async fn try_fetch(
        &self,
        endpoint: &EndpointConfig,
        request: &PageRequest,
    ) -> Result<ApiPage, FetchError> {
        let url = build_page_url(endpoint, request)?;
        let policy = if endpoint.retry { self.retry } else { RetryPolicy::none() };
        policy.execute(|| self.fetcher.fetch(&url)).await
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn normalize(endpoint: &EndpointConfig, page: ApiPage) -> PageResult {
    let total = match endpoint.total_count {
        TotalCountMode::Capped => TotalCount::Capped,
        TotalCountMode::Reported => {
            TotalCount::Exact(page.total_count.unwrap_or(page.items.len() as u64))
        }
    };
    PageResult::success(page.items, total)
}
