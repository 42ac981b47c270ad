//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! Every field has a default, so an empty file yields the two built-in
//! collections (`activities` and `suppliers`).

use serde::{Deserialize, Serialize};

/// Placeholder total reported for endpoints that cannot count their rows.
pub const CAPPED_TOTAL_COUNT: u64 = 1000;

const API_BASE: &str = "https://f2o3rbv3zd.execute-api.eu-west-1.amazonaws.com/prd";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Outbound HTTP client settings.
    pub http: HttpConfig,

    /// Backoff settings applied to endpoints with `retry = true`.
    pub retries: RetryConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Collections that can be queried.
    pub endpoints: Vec<EndpointConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            retries: RetryConfig::default(),
            observability: ObservabilityConfig::default(),
            endpoints: vec![EndpointConfig::activities(), EndpointConfig::suppliers()],
        }
    }
}

impl FetchConfig {
    /// Look up an endpoint by name.
    pub fn endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-attempt request timeout in seconds.
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("paged-fetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_attempts: u32,

    /// Base delay in milliseconds; the i-th retry waits `i² × base`.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_delay_ms: 500,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

/// How an endpoint's total row count is determined.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TotalCountMode {
    /// Trust the `total_count` field of the response.
    #[default]
    Reported,
    /// The API does not report a real total; always use [`CAPPED_TOTAL_COUNT`].
    Capped,
}

/// A logical collection reachable over HTTP.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Identifier used on the command line and in logs.
    pub name: String,

    /// Collection URL, without the page query.
    pub url: String,

    /// Whether the server understands `sort`/`order` query parameters.
    #[serde(default)]
    pub honors_sort: bool,

    #[serde(default)]
    pub total_count: TotalCountMode,

    /// Wrap fetches in the backoff policy.
    #[serde(default)]
    pub retry: bool,

    /// Report the committed page index to the page hook.
    #[serde(default)]
    pub persist_page: bool,
}

impl EndpointConfig {
    /// The activity ranking collection.
    ///
    /// Reports a true total. Sort parameters are not honored server-side.
    pub fn activities() -> Self {
        Self {
            name: "activities".to_string(),
            url: format!("{}/getactivitiesrank", API_BASE),
            honors_sort: false,
            total_count: TotalCountMode::Reported,
            retry: false,
            persist_page: false,
        }
    }

    /// The contracted suppliers collection.
    ///
    /// The API caps results at 1000 and does not return a total, so the
    /// count is always the capped sentinel. Sort parameters are ignored by
    /// the server; rows are not re-sorted locally.
    pub fn suppliers() -> Self {
        Self {
            name: "suppliers".to_string(),
            url: format!("{}/getsuppliers", API_BASE),
            honors_sort: false,
            total_count: TotalCountMode::Capped,
            retry: true,
            persist_page: true,
        }
    }
}
