//! Notification records and rendered messages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rule::Channel;

/// Why a notification was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Initial,
    SeverityIncrease,
    Escalation,
    Reminder,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::SeverityIncrease => "severity-increase",
            Self::Escalation => "escalation",
            Self::Reminder => "reminder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            Self::Initial,
            Self::SeverityIncrease,
            Self::Escalation,
            Self::Reminder,
        ]
        .into_iter()
        .find(|v| v.as_str() == s)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Recorded with the state change that triggered it; not yet settled.
    Pending,
    Sent,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [Self::Pending, Self::Sent, Self::Delivered, Self::Failed]
            .into_iter()
            .find(|v| v.as_str() == s)
    }
}

/// One delivery record for a (recipient, channel) pair. Append-only, except
/// that a `Pending` entry is settled in place once delivery finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationLog {
    pub id: String,
    pub alert_id: String,
    pub kind: NotificationKind,
    pub channel: Channel,
    pub recipient: String,
    pub sent_at: DateTime<Utc>,
    pub status: DeliveryStatus,
    /// Send attempts made so far, including the one this entry records.
    pub attempts: u32,
    pub message: String,
    /// Last transport error, set when `status` is `Failed`.
    pub error: Option<String>,
}

impl NotificationLog {
    pub fn is_failed(&self) -> bool {
        self.status == DeliveryStatus::Failed
    }

    pub fn is_pending(&self) -> bool {
        self.status == DeliveryStatus::Pending
    }
}

/// Rendered content handed to a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
}
