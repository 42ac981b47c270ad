//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Logical fetch:
//!     → retries.rs (run attempt, classify failure)
//!     → On retryable failure: backoff.rs (next delay, or give up)
//!     → sleep, then next attempt
//! ```
//!
//! # Design Decisions
//! - Quadratic schedule (i² × base), no jitter
//! - Retries are bounded; the last error is returned as-is
//! - Cancellation is by dropping the future

pub mod backoff;
pub mod retries;

pub use backoff::{quadratic_delay, DelayFn, RetryState};
pub use retries::{RetryPolicy, Retryable};
