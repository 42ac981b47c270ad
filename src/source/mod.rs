//! Paginated data source subsystem.
//!
//! # Data Flow
//! ```text
//! PageRequest + EndpointConfig
//!     → endpoint.rs (build ?page=N[&sort=..&order=..] URL)
//!     → data_source.rs (one logical fetch, wrapped in RetryPolicy if enabled)
//!         → fetcher.rs (single GET, classify failure into FetchError)
//!     → PageResult (success, or the empty "unavailable" shape)
//! ```
//!
//! # Design Decisions
//! - Errors are swallowed at the data source; callers read result flags
//! - Capped endpoints report a fixed total instead of inventing a count
//! - No client-side sorting for endpoints that ignore sort parameters

pub mod data_source;
pub mod endpoint;
pub mod error;
pub mod fetcher;
pub mod types;

pub use data_source::DataSource;
pub use endpoint::build_page_url;
pub use error::FetchError;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use types::{
    ActivityRank, ApiPage, PageRequest, PageResult, Record, SortDirection, Supplier, TotalCount,
};
