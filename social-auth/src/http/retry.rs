//! Exponential backoff for transient transport failures.

use std::time::{Duration, SystemTime};

use reqwest_retry::{RetryDecision, RetryPolicy};

/// Doubles the delay after every failed attempt, capped at `max_delay`.
pub struct BackoffPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl BackoffPolicy {
    /// A policy allowing at most `max_retries` retries, starting at half a second.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }

    fn delay_for(&self, n_past_retries: u32) -> Duration {
        let factor = 2_u32.saturating_pow(n_past_retries);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl RetryPolicy for BackoffPolicy {
    fn should_retry(&self, _request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        if n_past_retries >= self.max_retries {
            return RetryDecision::DoNotRetry;
        }
        RetryDecision::Retry {
            execute_after: SystemTime::now() + self.delay_for(n_past_retries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let policy = BackoffPolicy::new(3);
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = BackoffPolicy::new(40);
        assert_eq!(policy.delay_for(40), Duration::from_secs(10));
    }

    #[test]
    fn test_zero_retries_never_retries() {
        let policy = BackoffPolicy::new(0);
        assert!(matches!(
            policy.should_retry(SystemTime::now(), 0),
            RetryDecision::DoNotRetry
        ));
    }
}
