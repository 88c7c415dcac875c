//! RuleCatalog: one `AlertRule` per obligation type, persisted in the store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use vigil_core::config::defaults;
use vigil_core::errors::{ConfigError, VigilResult};
use vigil_core::models::{
    AlertRule, Channel, EscalationPolicy, NotificationSettings, ObligationType,
    SeverityThresholds,
};
use vigil_core::traits::IAlertStore;

/// Rules as read at the start of a cycle. Edits made mid-cycle apply from
/// the next cycle on.
#[derive(Debug, Clone, Default)]
pub struct RuleSnapshot {
    rules: BTreeMap<ObligationType, AlertRule>,
}

impl RuleSnapshot {
    pub fn new(rules: impl IntoIterator<Item = AlertRule>) -> Self {
        Self {
            rules: rules.into_iter().map(|r| (r.obligation_type, r)).collect(),
        }
    }

    pub fn get(&self, obligation_type: ObligationType) -> Option<&AlertRule> {
        self.rules.get(&obligation_type)
    }

    /// The rule for `obligation_type`, or `ConfigError::MissingRule`.
    pub fn require(&self, obligation_type: ObligationType) -> Result<&AlertRule, ConfigError> {
        self.get(obligation_type)
            .ok_or(ConfigError::MissingRule { obligation_type })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Clone)]
pub struct RuleCatalog {
    store: Arc<dyn IAlertStore>,
}

impl RuleCatalog {
    pub fn new(store: Arc<dyn IAlertStore>) -> Self {
        Self { store }
    }

    /// Built-in rule for each obligation type.
    pub fn default_rules() -> Vec<AlertRule> {
        ObligationType::ALL.into_iter().map(Self::default_rule).collect()
    }

    pub fn default_rule(obligation_type: ObligationType) -> AlertRule {
        let thresholds = match obligation_type {
            ObligationType::WhsAudit => SeverityThresholds::new(3, 7, 14, 30),
            ObligationType::TrainingCertification => SeverityThresholds::new(7, 14, 30, 45),
            _ => SeverityThresholds::default(),
        };
        AlertRule {
            obligation_type,
            thresholds,
            notification_settings: NotificationSettings {
                channels: BTreeSet::from([Channel::Email, Channel::InApp]),
                recipients: vec![defaults::DEFAULT_RECIPIENT.to_string()],
            },
            escalation: EscalationPolicy {
                escalate_after_days: defaults::DEFAULT_ESCALATE_AFTER_DAYS,
                escalate_to: vec![defaults::DEFAULT_ESCALATION_RECIPIENT.to_string()],
            },
            is_active: true,
        }
    }

    pub fn snapshot(&self) -> VigilResult<RuleSnapshot> {
        Ok(RuleSnapshot::new(self.store.list_rules()?))
    }

    pub fn list_rules(&self) -> VigilResult<Vec<AlertRule>> {
        self.store.list_rules()
    }

    pub fn get_rule(&self, obligation_type: ObligationType) -> VigilResult<AlertRule> {
        self.store
            .get_rule(obligation_type)?
            .ok_or_else(|| ConfigError::MissingRule { obligation_type }.into())
    }

    /// Validate and store `rule`, replacing any rule for the same type.
    pub fn upsert_rule(&self, rule: &AlertRule) -> VigilResult<()> {
        rule.validate()?;
        self.store.upsert_rule(rule)?;
        tracing::info!(obligation_type = %rule.obligation_type, active = rule.is_active, "alert rule saved");
        Ok(())
    }

    /// Insert rules for types that have none yet. Existing rules are kept.
    /// Returns how many were inserted.
    pub fn seed_rules(&self, rules: impl IntoIterator<Item = AlertRule>) -> VigilResult<usize> {
        let mut inserted = 0;
        for rule in rules {
            rule.validate()?;
            if self.store.insert_rule_if_absent(&rule)? {
                tracing::debug!(obligation_type = %rule.obligation_type, "seeded alert rule");
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}
