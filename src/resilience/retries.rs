//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failure is worth retrying ([`Retryable`])
//! - Run an async operation, retrying with the backoff schedule
//! - Surface the last failure unchanged once retries are exhausted
//!
//! # Design Decisions
//! - A plain loop with an explicit [`RetryState`], not combinator plumbing
//! - The first attempt is never delayed
//! - The loop is an ordinary future: dropping it cancels a pending delay

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::{quadratic_delay, DelayFn, RetryState};

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Bounded retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    delay_fn: DelayFn,
}

impl RetryPolicy {
    /// Retry up to `max_attempts` times, waiting `i² × base_delay_ms` before the i-th retry.
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            delay_fn: quadratic_delay,
        }
    }

    /// A policy that runs the operation exactly once.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay_ms)
    }

    /// Replace the delay schedule.
    pub fn with_delay_fn(mut self, delay_fn: DelayFn) -> Self {
        self.delay_fn = delay_fn;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay_ms(&self) -> u64 {
        self.base_delay_ms
    }

    /// Fresh state for one logical operation.
    pub fn state(&self) -> RetryState {
        RetryState::new(self.max_attempts, self.base_delay_ms)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the retries run out.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut state = self.state();

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_retryable() {
                tracing::debug!(
                    attempt = state.attempt_number(),
                    error = %err,
                    "Failure is not retryable"
                );
                return Err(err);
            }

            let Some(delay) = state.next_delay(self.delay_fn) else {
                if state.max_attempts() > 0 {
                    tracing::warn!(
                        attempts = state.attempt_number(),
                        error = %err,
                        "Retries exhausted"
                    );
                }
                return Err(err);
            };

            tracing::info!(
                retry = state.retries(),
                max_attempts = state.max_attempts(),
                delay_ms = delay_millis(delay),
                error = %err,
                "Retrying after failure"
            );
            metrics::record_retry();
            tokio::time::sleep(delay).await;
        }
    }
}

/// Whole milliseconds of `delay`, saturating at `u64::MAX`.
fn delay_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
