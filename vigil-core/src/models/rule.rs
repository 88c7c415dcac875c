//! Alert rules: one per obligation type, owned by the rule catalog.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::obligation::ObligationType;
use super::severity::SeverityThresholds;
use crate::errors::ConfigError;

/// Delivery channel for notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Email,
    Sms,
    InApp,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Self::Email, Self::Sms, Self::InApp];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::InApp => "in-app",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Synchronous channels confirm delivery at send time.
    pub fn is_synchronous(self) -> bool {
        matches!(self, Self::InApp)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where standard notifications for a rule go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub channels: BTreeSet<Channel>,
    pub recipients: Vec<String>,
}

/// Who hears about an alert left untouched for too long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationPolicy {
    pub escalate_after_days: u32,
    pub escalate_to: Vec<String>,
}

/// Per-obligation-type alerting policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRule {
    pub obligation_type: ObligationType,
    pub thresholds: SeverityThresholds,
    pub notification_settings: NotificationSettings,
    pub escalation: EscalationPolicy,
    pub is_active: bool,
}

impl AlertRule {
    /// Check thresholds, channels, recipients and escalation policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRule {
            obligation_type: self.obligation_type,
            reason,
        };

        self.thresholds.validate().map_err(invalid)?;
        if self.notification_settings.channels.is_empty() {
            return Err(invalid("at least one notification channel is required".into()));
        }
        if self
            .notification_settings
            .recipients
            .iter()
            .all(|r| r.trim().is_empty())
        {
            return Err(invalid("at least one recipient is required".into()));
        }
        if self.escalation.escalate_after_days == 0 {
            return Err(invalid("escalate_after_days must be >= 1".into()));
        }
        Ok(())
    }

    /// Standard recipients followed by escalation recipients, without duplicates.
    pub fn escalation_recipients(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in self
            .notification_settings
            .recipients
            .iter()
            .chain(self.escalation.escalate_to.iter())
        {
            if !out.contains(r) {
                out.push(r.clone());
            }
        }
        out
    }
}
