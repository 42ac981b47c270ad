//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! resilience, source, feed
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters via the metrics facade)
//! ```
//!
//! # Design Decisions
//! - Structured fields (endpoint, page, attempt, generation) over formatted strings
//! - Library code only emits; the binary installs the subscriber

pub mod logging;
pub mod metrics;
