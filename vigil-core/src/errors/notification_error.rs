//! Notification transport errors. Recorded as `failed` log entries by the
//! dispatcher; never propagated to the state change that triggered them.

use super::error_code::{self, VigilErrorCode};
use crate::models::Channel;

#[derive(Debug, Clone, thiserror::Error)]
pub enum NotificationError {
    /// Transient transport failure; eligible for retry.
    #[error("{channel} send to {recipient} failed: {message}")]
    Transport {
        channel: Channel,
        recipient: String,
        message: String,
    },

    /// Permanent rejection (bad address, unsubscribed, ...); not retried.
    #[error("{channel} rejected recipient {recipient}: {message}")]
    Rejected {
        channel: Channel,
        recipient: String,
        message: String,
    },

    #[error("send timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("no notifier registered for channel {channel}")]
    NoNotifier { channel: Channel },

    #[error("send task failed: {message}")]
    TaskFailed { message: String },
}

impl NotificationError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::TaskFailed { .. }
        )
    }
}

impl VigilErrorCode for NotificationError {
    fn error_code(&self) -> &'static str {
        error_code::NOTIFICATION_FAILURE
    }
}
