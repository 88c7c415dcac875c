use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::alert::AlertStatus;
use super::severity::Severity;

/// Summary counts for dashboard cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total: usize,
    pub by_status: BTreeMap<AlertStatus, usize>,
    pub open_by_severity: BTreeMap<Severity, usize>,
}

impl AlertStats {
    pub fn open(&self) -> usize {
        self.count(AlertStatus::Active) + self.count(AlertStatus::Acknowledged)
    }

    pub fn count(&self, status: AlertStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn open_with(&self, severity: Severity) -> usize {
        self.open_by_severity.get(&severity).copied().unwrap_or(0)
    }
}
