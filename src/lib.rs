//! Paginated, sortable table fetching with bounded quadratic backoff.

pub mod config;
pub mod feed;
pub mod observability;
pub mod resilience;
pub mod source;

pub use config::FetchConfig;
pub use feed::TableFeed;
pub use source::{DataSource, PageRequest, PageResult};
