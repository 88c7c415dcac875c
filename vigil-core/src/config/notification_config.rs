use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Notification dispatcher configuration: retry, timeout, concurrency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Attempts per (recipient, channel) pair, including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt.
    pub initial_backoff_ms: u64,
    /// Backoff ceiling.
    pub max_backoff_ms: u64,
    /// Backoff growth factor between attempts.
    pub backoff_multiplier: u32,
    /// Per-attempt send timeout; a timeout counts as a transient failure.
    pub send_timeout_ms: u64,
    /// Upper bound on concurrently running sends per channel. A send that
    /// timed out still counts until its transport call returns.
    pub max_concurrent_sends: usize,
    /// How long shutdown waits for in-flight sends before marking their
    /// pending log entries failed.
    pub shutdown_grace_ms: u64,
}

impl NotificationConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: defaults::DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: defaults::DEFAULT_MAX_BACKOFF_MS,
            backoff_multiplier: defaults::DEFAULT_BACKOFF_MULTIPLIER,
            send_timeout_ms: defaults::DEFAULT_SEND_TIMEOUT_MS,
            max_concurrent_sends: defaults::DEFAULT_MAX_CONCURRENT_SENDS,
            shutdown_grace_ms: defaults::DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}
