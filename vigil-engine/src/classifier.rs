//! SeverityClassifier: pure mapping from (obligation, rule, now) to a tier.

use chrono::{DateTime, Utc};

use vigil_core::constants::SECONDS_PER_DAY;
use vigil_core::errors::EvaluationError;
use vigil_core::models::{AlertRule, MonitoredObligation, Severity};

/// Whole days from `now` until `expiry`, floored. Negative when overdue.
pub fn days_until_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expiry - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The rule is switched off; no alert is raised or refreshed.
    RuleInactive,
    /// More clear days left than the `low` bound.
    NotDue { days: i64 },
    Tier { severity: Severity, days: i64 },
}

impl Classification {
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Self::Tier { severity, .. } => Some(*severity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityClassifier;

impl SeverityClassifier {
    /// Tier for the obligation, or `None` when inactive or not yet due.
    pub fn classify(
        obligation: &MonitoredObligation,
        rule: &AlertRule,
        now: DateTime<Utc>,
    ) -> Result<Option<Severity>, EvaluationError> {
        Ok(Self::assess(obligation, rule, now)?.severity())
    }

    pub fn assess(
        obligation: &MonitoredObligation,
        rule: &AlertRule,
        now: DateTime<Utc>,
    ) -> Result<Classification, EvaluationError> {
        if !rule.is_active {
            return Ok(Classification::RuleInactive);
        }
        let expiry = obligation
            .expiry_date
            .ok_or_else(|| EvaluationError::MissingExpiry {
                obligation_id: obligation.id.clone(),
            })?;
        let days = days_until_expiry(expiry, now);

        // Overdue is critical whatever the configured bounds say.
        if days < 0 {
            return Ok(Classification::Tier {
                severity: Severity::Critical,
                days,
            });
        }
        Ok(match rule.thresholds.tier_for(days) {
            Some(severity) => Classification::Tier { severity, days },
            None => Classification::NotDue { days },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, TimeZone};
    use vigil_core::models::{
        Channel, EscalationPolicy, NotificationSettings, ObligationType, SeverityThresholds,
    };

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn rule(thresholds: SeverityThresholds) -> AlertRule {
        AlertRule {
            obligation_type: ObligationType::Insurance,
            thresholds,
            notification_settings: NotificationSettings {
                channels: BTreeSet::from([Channel::Email]),
                recipients: vec!["officer".into()],
            },
            escalation: EscalationPolicy {
                escalate_after_days: 3,
                escalate_to: vec![],
            },
            is_active: true,
        }
    }

    fn expiring_in(days: i64) -> MonitoredObligation {
        MonitoredObligation::new(
            "ins-1",
            ObligationType::Insurance,
            "Fleet insurance",
            now() + Duration::days(days),
            "fleet",
        )
    }

    #[test]
    fn day_arithmetic_floors() {
        assert_eq!(days_until_expiry(now() + Duration::hours(23), now()), 0);
        assert_eq!(days_until_expiry(now() + Duration::hours(25), now()), 1);
        assert_eq!(days_until_expiry(now() - Duration::hours(1), now()), -1);
        assert_eq!(days_until_expiry(now() - Duration::days(5), now()), -5);
    }

    #[test]
    fn fifteen_days_out_is_high() {
        let r = rule(SeverityThresholds::default());
        assert_eq!(
            SeverityClassifier::classify(&expiring_in(15), &r, now()).unwrap(),
            Some(Severity::High)
        );
        assert_eq!(
            SeverityClassifier::classify(&expiring_in(5), &r, now()).unwrap(),
            Some(Severity::Critical)
        );
        assert_eq!(
            SeverityClassifier::classify(&expiring_in(61), &r, now()).unwrap(),
            Some(Severity::Low)
        );
        assert_eq!(SeverityClassifier::classify(&expiring_in(62), &r, now()).unwrap(), None);
    }

    #[test]
    fn tier_changes_the_day_after_a_bound_is_crossed() {
        let r = rule(SeverityThresholds::default());
        let at = |days| SeverityClassifier::classify(&expiring_in(days), &r, now()).unwrap();
        assert_eq!(at(16), Some(Severity::Medium));
        assert_eq!(at(15), Some(Severity::High));
        assert_eq!(at(9), Some(Severity::High));
        assert_eq!(at(8), Some(Severity::Critical));
        assert_eq!(at(0), Some(Severity::Critical));
    }

    #[test]
    fn overdue_floor_holds_with_zero_critical_bound() {
        let r = rule(SeverityThresholds::new(0, 0, 0, 0));
        assert_eq!(
            SeverityClassifier::assess(&expiring_in(-5), &r, now()).unwrap(),
            Classification::Tier {
                severity: Severity::Critical,
                days: -5
            }
        );
    }

    #[test]
    fn inactive_rule_never_classifies() {
        let mut r = rule(SeverityThresholds::default());
        r.is_active = false;
        assert_eq!(
            SeverityClassifier::assess(&expiring_in(-3), &r, now()).unwrap(),
            Classification::RuleInactive
        );
    }

    #[test]
    fn missing_expiry_is_an_error() {
        let mut ob = expiring_in(3);
        ob.expiry_date = None;
        let err = SeverityClassifier::classify(&ob, &rule(SeverityThresholds::default()), now())
            .unwrap_err();
        assert!(matches!(err, EvaluationError::MissingExpiry { .. }));
    }
}
