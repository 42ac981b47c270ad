//! Fetch error taxonomy.

use reqwest::StatusCode;
use thiserror::Error;

use crate::resilience::Retryable;

/// Errors raised while fetching a page. They never leave the data source;
/// callers only see [`PageResult`](crate::source::PageResult) flags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, timeout, or server-side failure that may clear up.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// The API answered 429.
    #[error("rate limit reached")]
    RateLimited,

    /// Anything a retry cannot fix.
    #[error("request failed: {0}")]
    Permanent(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::TransientNetwork(_) | FetchError::RateLimited)
    }

    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::TransientNetwork(_) => "transient",
            FetchError::RateLimited => "rate_limited",
            FetchError::Permanent(_) => "permanent",
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            FetchError::RateLimited
        } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            FetchError::TransientNetwork(format!("server returned {}", status))
        } else {
            FetchError::Permanent(format!("server returned {}", status))
        }
    }
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return FetchError::from_status(status);
        }
        if e.is_builder() || e.is_decode() {
            FetchError::Permanent(e.to_string())
        } else {
            FetchError::TransientNetwork(e.to_string())
        }
    }
}
