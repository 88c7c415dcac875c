//! Retry policy: bounded attempts with exponential backoff.

use std::time::Duration;

use vigil_core::config::NotificationConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Wait before the second attempt.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
            multiplier: config.backoff_multiplier.max(1),
        }
    }

    /// Backoff to wait after `attempt` (1-based) failed.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let mut backoff = self.initial_backoff;
        for _ in 1..attempt {
            backoff = backoff.saturating_mul(self.multiplier).min(self.max_backoff);
        }
        backoff.min(self.max_backoff)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_millis(3000),
            multiplier: 2,
        };
        assert_eq!(policy.backoff_after(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_after(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff_after(4), Duration::from_millis(3000));
        assert_eq!(policy.backoff_after(9), Duration::from_millis(3000));
    }

    #[test]
    fn attempts_are_bounded() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
