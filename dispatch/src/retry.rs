//! Bounded retry with exponential backoff for optimistic-concurrency
//! conflicts.
//!
//! Only [`EventStoreError::ConcurrencyConflict`] is ever retried: the loser
//! of a concurrent append reloads the stream, re-decides against the fresh
//! state, and tries again. Validation failures and store outages are never
//! retried here.
//!
//! [`EventStoreError::ConcurrencyConflict`]: address_registry_core::event_store::EventStoreError::ConcurrencyConflict

use std::time::Duration;

/// Retry policy for contested appends.
///
/// # Default Values
///
/// - `max_retries`: 3
/// - `initial_delay`: 25ms
/// - `max_delay`: 1 second
/// - `multiplier`: 2.0 (delay doubles each retry)
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of reload-and-retry rounds after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap for the exponential backoff.
    pub max_delay: Duration,
    /// Multiplier applied per retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(25),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries; the first conflict surfaces directly.
    #[must_use]
    pub const fn no_retries() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before the retry with the given 0-based attempt number.
    ///
    /// Exponential backoff: `initial_delay * multiplier^attempt`, capped at
    /// `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(millis as u64);
        delay.min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(25));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(50));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(1));
    }

    #[test]
    fn no_retries_policy_is_inert() {
        let policy = RetryPolicy::no_retries();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.delay_for_attempt(3), Duration::ZERO);
    }
}
