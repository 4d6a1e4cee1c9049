//! Retry policy with linearly increasing backoff for resilient lookups.

use std::time::Duration;

/// Configuration for retry behavior
///
/// The policy is independent of the operation it wraps: callers run their
/// own attempt loop and ask the policy how long to wait after each failed
/// attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (total, not retries after the first)
    pub max_attempts: u32,
    /// Base delay; the wait after attempt `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt bound and base delay
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay to wait after the given 1-based attempt number fails.
    ///
    /// Produces the increasing schedule `base, 2*base, 3*base, ...`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Whether another attempt is allowed after `attempt` attempts have run
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_linear_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for(3), Duration::from_secs(15));
    }

    #[test]
    fn test_has_next() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        assert!(policy.has_next(1));
        assert!(policy.has_next(2));
        assert!(!policy.has_next(3));
        assert!(!policy.has_next(4));
    }

    #[test]
    fn test_custom_base_delay() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        assert_eq!(policy.delay_for(4), Duration::from_millis(40));
    }
}
