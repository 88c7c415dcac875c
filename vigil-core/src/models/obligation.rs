//! Monitored obligations: the external, read-only entities the engine watches.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of time-bound compliance requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObligationType {
    MouExpiry,
    SiteCertification,
    Insurance,
    WhsAudit,
    ContractRenewal,
    TrainingCertification,
}

impl ObligationType {
    pub const ALL: [ObligationType; 6] = [
        Self::MouExpiry,
        Self::SiteCertification,
        Self::Insurance,
        Self::WhsAudit,
        Self::ContractRenewal,
        Self::TrainingCertification,
    ];

    /// Stable wire/storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MouExpiry => "mou-expiry",
            Self::SiteCertification => "site-certification",
            Self::Insurance => "insurance",
            Self::WhsAudit => "whs-audit",
            Self::ContractRenewal => "contract-renewal",
            Self::TrainingCertification => "training-certification",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Human-readable label used in alert titles.
    pub fn label(self) -> &'static str {
        match self {
            Self::MouExpiry => "MoU",
            Self::SiteCertification => "Site certification",
            Self::Insurance => "Insurance policy",
            Self::WhsAudit => "WHS audit",
            Self::ContractRenewal => "Contract",
            Self::TrainingCertification => "Training certification",
        }
    }
}

impl fmt::Display for ObligationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-bound compliance requirement supplied by an `ObligationSource`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredObligation {
    pub id: String,
    pub obligation_type: ObligationType,
    pub name: String,
    /// Must be present for classification; a missing date is an evaluation error.
    pub expiry_date: Option<DateTime<Utc>>,
    /// Reference to the owning entity (partner, site, contractor, ...).
    pub owner: String,
}

impl MonitoredObligation {
    pub fn new(
        id: impl Into<String>,
        obligation_type: ObligationType,
        name: impl Into<String>,
        expiry_date: DateTime<Utc>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            obligation_type,
            name: name.into(),
            expiry_date: Some(expiry_date),
            owner: owner.into(),
        }
    }
}
