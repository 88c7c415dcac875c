//! Listing filters for alerts. Unset fields match everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

use super::alert::{AlertStatus, ComplianceAlert};
use super::obligation::ObligationType;
use super::severity::Severity;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub status: Option<AlertStatus>,
    pub obligation_type: Option<ObligationType>,
    pub obligation_id: Option<String>,
}

impl AlertFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_status(mut self, status: AlertStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_type(mut self, obligation_type: ObligationType) -> Self {
        self.obligation_type = Some(obligation_type);
        self
    }

    pub fn with_obligation(mut self, obligation_id: impl Into<String>) -> Self {
        self.obligation_id = Some(obligation_id.into());
        self
    }

    pub fn matches(&self, alert: &ComplianceAlert) -> bool {
        self.severity.map_or(true, |s| alert.severity == s)
            && self.status.map_or(true, |s| alert.status == s)
            && self
                .obligation_type
                .map_or(true, |t| alert.obligation_type == t)
            && self
                .obligation_id
                .as_deref()
                .map_or(true, |id| alert.obligation_id == id)
    }
}

/// Keyset position in the newest-first alert listing: the last alert of the
/// previous page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCursor {
    pub created_at: DateTime<Utc>,
    pub id: String,
}

impl AlertCursor {
    pub fn after(alert: &ComplianceAlert) -> Self {
        Self {
            created_at: alert.created_at,
            id: alert.id.clone(),
        }
    }
}

/// One page of a filtered listing. `next` is set while more alerts remain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPage {
    pub alerts: Vec<ComplianceAlert>,
    pub next: Option<AlertCursor>,
}

impl AlertPage {
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

/// Clamp a requested page size to `1..=MAX_PAGE_SIZE`; zero means the default.
pub fn page_size(requested: usize) -> usize {
    if requested == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        requested.min(MAX_PAGE_SIZE)
    }
}
