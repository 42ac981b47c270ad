//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FetchConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Endpoints are static configuration, never discovered at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    EndpointConfig, FetchConfig, HttpConfig, ObservabilityConfig, RetryConfig, TotalCountMode,
    CAPPED_TOTAL_COUNT,
};
