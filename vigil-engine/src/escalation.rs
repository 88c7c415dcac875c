//! EscalationEngine: widens notification fan-out for neglected open alerts.
//!
//! An alert escalates at most once per state epoch: the epoch starts at
//! creation and restarts on acknowledgement. `last_escalated_at` and the
//! pending escalation log entries are written in the same transaction that
//! re-checks eligibility, so repeated or concurrent runs cannot fire twice and
//! an escalation is never marked without a record of it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use vigil_core::errors::{VigilError, VigilResult};
use vigil_core::models::{AlertRule, ComplianceAlert};
use vigil_core::traits::{Clock, IAlertStore};
use vigil_notify::{NotificationDispatcher, NotificationJob};

use crate::catalog::RuleSnapshot;

#[derive(Debug, Default)]
pub struct EscalationReport {
    pub examined: usize,
    /// Ids of alerts escalated in this run.
    pub escalated: Vec<String>,
    pub missing_rule: usize,
    pub failures: Vec<(String, VigilError)>,
}

#[derive(Clone)]
pub struct EscalationEngine {
    store: Arc<dyn IAlertStore>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl EscalationEngine {
    pub fn new(
        store: Arc<dyn IAlertStore>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
        }
    }

    /// Escalate every eligible open alert. Inactive rules still escalate.
    pub fn run(&self, rules: &RuleSnapshot) -> EscalationReport {
        let mut report = EscalationReport::default();
        let now = self.clock.now();

        let open = match self.store.list_open_alerts() {
            Ok(open) => open,
            Err(e) => {
                tracing::error!(error = %e, "failed to load open alerts for escalation");
                report.failures.push((String::new(), e));
                return report;
            }
        };
        let _span = vigil_core::escalation_span!(open.len()).entered();

        for alert in open {
            report.examined += 1;
            let Some(rule) = rules.get(alert.obligation_type) else {
                tracing::error!(
                    alert_id = %alert.id,
                    obligation_type = %alert.obligation_type,
                    "no alert rule configured; escalation skipped"
                );
                report.missing_rule += 1;
                continue;
            };
            if !alert.escalation_due(rule.escalation.escalate_after_days, now) {
                continue;
            }

            match self.escalate(&alert.id, rule, now) {
                Ok(Some((updated, job))) => {
                    tracing::info!(
                        alert_id = %updated.id,
                        status = %updated.status,
                        escalate_after_days = rule.escalation.escalate_after_days,
                        "alert escalated"
                    );
                    self.dispatcher.submit(job);
                    report.escalated.push(updated.id);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(alert_id = %alert.id, error = %e, "escalation failed");
                    report.failures.push((alert.id, e));
                }
            }
        }
        report
    }

    /// Stamp the escalation marker if still due, together with a pending log
    /// entry per escalation pair. `None` when another writer got there first
    /// or the alert closed meanwhile.
    fn escalate(
        &self,
        alert_id: &str,
        rule: &AlertRule,
        now: DateTime<Utc>,
    ) -> VigilResult<Option<(ComplianceAlert, NotificationJob)>> {
        let mut job = None;
        let updated = self.store.update_alert(alert_id, &mut |a| {
            job = None;
            if a.escalation_due(rule.escalation.escalate_after_days, now) {
                a.last_escalated_at = Some(now);
                a.updated_at = now;
                let escalation = NotificationJob::escalation(a, rule);
                a.notifications.extend(escalation.pending_logs(now));
                job = Some(escalation);
            }
            Ok(())
        })?;
        Ok(job.map(|job| (updated, job)))
    }
}
