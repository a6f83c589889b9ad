use std::time::Duration;

use backon::{ConstantBuilder, ExponentialBuilder};

/// Bounded retry for the bulk-add call: one initial attempt, then up to
/// `max_retries` more with a fixed `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }

    pub fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.max_retries)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// Local retry of transient search failures, with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_attempts: usize,
    pub initial_backoff: Duration,
}

impl SearchRetryPolicy {
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_backoff)
            .with_max_delay(self.initial_backoff * 16)
            .with_max_times(self.max_attempts.saturating_sub(1))
            .with_jitter()
    }
}

impl Default for SearchRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bulk_add_policy_allows_six_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 6);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_constant_backoff_yields_fixed_delays() {
        let policy = RetryPolicy {
            max_retries: 3,
            delay: Duration::from_secs(2),
        };
        let delays: Vec<_> = backon::BackoffBuilder::build(policy.backoff()).collect();
        assert_eq!(delays, vec![Duration::from_secs(2); 3]);
    }

    #[test]
    fn test_single_attempt_search_policy_never_retries() {
        let policy = SearchRetryPolicy {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(10),
        };
        let delays: Vec<_> = backon::BackoffBuilder::build(policy.backoff()).collect();
        assert!(delays.is_empty());
    }
}
