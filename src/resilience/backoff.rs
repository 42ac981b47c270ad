//! Quadratic backoff schedule.

use std::time::Duration;

/// Signature of a retry delay function: `(retry index, base_ms) -> delay`.
///
/// The retry index is 1-based; index 0 is the initial attempt.
pub type DelayFn = fn(u32, u64) -> Duration;

/// Delay before the `retry`-th retry: `retry² × base_ms`.
///
/// The growth is quadratic, not exponential: 1×, 4×, 9×, 16× the base.
/// The initial attempt (`retry == 0`) is never delayed.
pub fn quadratic_delay(retry: u32, base_ms: u64) -> Duration {
    let factor = u64::from(retry).saturating_mul(u64::from(retry));
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// Tracks one logical fetch's progress through the retry schedule.
///
/// `attempt_number` counts invocations of the operation, starting at 1 for
/// the initial call. `max_attempts` bounds the number of retries on top of
/// that call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempt_number: u32,
    max_attempts: u32,
    base_delay_ms: u64,
}

impl RetryState {
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            attempt_number: 1,
            max_attempts,
            base_delay_ms,
        }
    }

    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Retries scheduled so far.
    pub fn retries(&self) -> u32 {
        self.attempt_number - 1
    }

    pub fn is_exhausted(&self) -> bool {
        self.retries() >= self.max_attempts
    }

    /// Record a failed attempt and compute the wait before the next one.
    ///
    /// Returns `None` once all retries are used; the caller must then give up.
    pub fn next_delay(&mut self, delay_fn: DelayFn) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let retry = self.attempt_number;
        self.attempt_number += 1;
        Some(delay_fn(retry, self.base_delay_ms))
    }
}
