//! EvaluationScheduler: one reconciliation pass over every obligation.
//!
//! Each obligation is classified and its open alert created, refreshed or
//! auto-resolved in its own store transaction. A failure on one obligation is
//! recorded in the `CycleReport` and the pass moves on.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use vigil_core::constants::AUTO_RESOLVE_ACTOR;
use vigil_core::errors::{ConfigError, EvaluationError, StorageError, VigilError, VigilResult};
use vigil_core::models::{
    AlertRule, ComplianceAlert, LifecycleCommand, MonitoredObligation, NotificationKind, Severity,
};
use vigil_core::traits::{Cancellable, CancellationToken, Clock, IAlertStore, ObligationSource};
use vigil_notify::{NotificationDispatcher, NotificationJob};

use crate::catalog::{RuleCatalog, RuleSnapshot};
use crate::classifier::{Classification, SeverityClassifier};
use crate::escalation::{EscalationEngine, EscalationReport};

/// What reconciliation did for one obligation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { alert_id: String, severity: Severity },
    /// Severity went up; a re-notification was submitted.
    Raised { alert_id: String, from: Severity, to: Severity },
    /// Refreshed in place without notification (same or lower severity).
    Refreshed { alert_id: String, severity: Severity },
    AutoResolved { alert_id: String },
    NotDue,
    RuleInactive,
}

#[derive(Debug)]
pub struct ObligationFailure {
    pub obligation_id: String,
    pub error: VigilError,
}

#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub evaluated: usize,
    pub outcomes: Vec<(String, Outcome)>,
    pub failures: Vec<ObligationFailure>,
    pub escalation: Option<EscalationReport>,
    /// The token fired before every obligation was visited.
    pub cancelled: bool,
}

impl CycleReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            evaluated: 0,
            outcomes: Vec::new(),
            failures: Vec::new(),
            escalation: None,
            cancelled: false,
        }
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created { .. }))
    }

    pub fn raised(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Raised { .. }))
    }

    pub fn auto_resolved(&self) -> usize {
        self.count(|o| matches!(o, Outcome::AutoResolved { .. }))
    }

    pub fn escalated(&self) -> usize {
        self.escalation.as_ref().map_or(0, |e| e.escalated.len())
    }

    pub fn outcome_for(&self, obligation_id: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == obligation_id)
            .map(|(_, o)| o)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub struct EvaluationScheduler {
    source: Arc<dyn ObligationSource>,
    catalog: RuleCatalog,
    store: Arc<dyn IAlertStore>,
    dispatcher: NotificationDispatcher,
    escalation: EscalationEngine,
    clock: Arc<dyn Clock>,
    run_escalation: bool,
}

impl EvaluationScheduler {
    pub fn new(
        source: Arc<dyn ObligationSource>,
        store: Arc<dyn IAlertStore>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        run_escalation: bool,
    ) -> Self {
        Self {
            source,
            catalog: RuleCatalog::new(Arc::clone(&store)),
            escalation: EscalationEngine::new(Arc::clone(&store), dispatcher.clone(), Arc::clone(&clock)),
            store,
            dispatcher,
            clock,
            run_escalation,
        }
    }

    /// Run one evaluation cycle, then the escalation pass.
    ///
    /// Fails only when the cycle cannot start (source or rules unreadable,
    /// or already cancelled). `cancel` is checked between obligations.
    pub fn run_cycle(&self, cancel: &CancellationToken) -> VigilResult<CycleReport> {
        if cancel.is_cancelled() {
            return Err(EvaluationError::Cancelled.into());
        }
        let now = self.clock.now();
        let rules = self.catalog.snapshot()?;
        let obligations = self.source.list_obligations().map_err(|e| {
            tracing::error!(error = %e, "obligation source unavailable");
            e
        })?;

        let span = vigil_core::evaluation_span!(obligations.len());
        let _entered = span.enter();
        tracing::info!(obligations = obligations.len(), rules = rules.len(), "evaluation cycle started");

        let mut report = CycleReport::new(now);
        for obligation in &obligations {
            if cancel.is_cancelled() {
                report.cancelled = true;
                tracing::info!(evaluated = report.evaluated, "evaluation cycle cancelled");
                break;
            }
            report.evaluated += 1;
            match self.evaluate(obligation, &rules, now) {
                Ok(outcome) => report.outcomes.push((obligation.id.clone(), outcome)),
                Err(error) => {
                    log_failure(obligation, &error);
                    report.failures.push(ObligationFailure {
                        obligation_id: obligation.id.clone(),
                        error,
                    });
                }
            }
        }

        if self.run_escalation && !report.cancelled {
            report.escalation = Some(self.escalation.run(&rules));
        }

        tracing::info!(
            evaluated = report.evaluated,
            created = report.created(),
            raised = report.raised(),
            auto_resolved = report.auto_resolved(),
            escalated = report.escalated(),
            failures = report.failures.len(),
            "evaluation cycle finished"
        );
        Ok(report)
    }

    /// Reconcile a single obligation against the store.
    pub fn evaluate(
        &self,
        obligation: &MonitoredObligation,
        rules: &RuleSnapshot,
        now: DateTime<Utc>,
    ) -> VigilResult<Outcome> {
        let rule = rules.require(obligation.obligation_type)?;

        match SeverityClassifier::assess(obligation, rule, now)? {
            Classification::RuleInactive => Ok(Outcome::RuleInactive),
            Classification::NotDue { .. } => self.auto_resolve(obligation, now),
            Classification::Tier { severity, days } => {
                let expiry = obligation
                    .expiry_date
                    .ok_or_else(|| EvaluationError::MissingExpiry {
                        obligation_id: obligation.id.clone(),
                    })?;
                match self.store.find_open_alert(&obligation.id, obligation.obligation_type)? {
                    Some(open) => self.refresh(&open.id, rule, severity, days, expiry, now),
                    None => self.create(obligation, rule, severity, days, expiry, now),
                }
            }
        }
    }

    fn create(
        &self,
        obligation: &MonitoredObligation,
        rule: &AlertRule,
        severity: Severity,
        days: i64,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> VigilResult<Outcome> {
        let assigned_to: BTreeSet<String> =
            rule.notification_settings.recipients.iter().cloned().collect();
        let mut alert = ComplianceAlert::open(obligation, expiry, severity, days, assigned_to, now);
        let job = NotificationJob::standard(&alert, rule, NotificationKind::Initial);
        alert.notifications.extend(job.pending_logs(now));

        match self.store.create_alert(&alert) {
            Ok(()) => {}
            // Another writer opened one since the lookup; refresh that one.
            Err(VigilError::Storage(StorageError::DuplicateOpenAlert { .. })) => {
                let open = self
                    .store
                    .find_open_alert(&obligation.id, obligation.obligation_type)?
                    .ok_or_else(|| VigilError::alert_not_found(&obligation.id))?;
                return self.refresh(&open.id, rule, severity, days, expiry, now);
            }
            Err(e) => return Err(e),
        }

        tracing::info!(
            alert_id = %alert.id,
            obligation_id = %obligation.id,
            severity = %severity,
            days_until_expiry = days,
            "alert created"
        );
        self.dispatcher.submit(job);
        Ok(Outcome::Created {
            alert_id: alert.id,
            severity,
        })
    }

    fn refresh(
        &self,
        alert_id: &str,
        rule: &AlertRule,
        severity: Severity,
        days: i64,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> VigilResult<Outcome> {
        let mut previous = severity;
        let mut job = None;
        let updated = self.store.update_alert(alert_id, &mut |a| {
            job = None;
            let open = a.is_open();
            previous = a.record_evaluation(severity, days, expiry, now);
            if open && severity > previous {
                let raised = NotificationJob::standard(a, rule, NotificationKind::SeverityIncrease);
                a.notifications.extend(raised.pending_logs(now));
                job = Some(raised);
            }
            Ok(())
        })?;

        if let Some(job) = job {
            tracing::info!(
                alert_id = %updated.id,
                from = %previous,
                to = %severity,
                "alert severity raised"
            );
            self.dispatcher.submit(job);
            return Ok(Outcome::Raised {
                alert_id: updated.id,
                from: previous,
                to: severity,
            });
        }
        Ok(Outcome::Refreshed {
            alert_id: updated.id,
            severity: updated.severity,
        })
    }

    /// Resolve the open alert of an obligation that is no longer due.
    fn auto_resolve(&self, obligation: &MonitoredObligation, now: DateTime<Utc>) -> VigilResult<Outcome> {
        let Some(open) = self
            .store
            .find_open_alert(&obligation.id, obligation.obligation_type)?
        else {
            return Ok(Outcome::NotDue);
        };

        let mut resolved = false;
        self.store.update_alert(&open.id, &mut |a| {
            resolved = a.is_open();
            if resolved {
                a.apply(LifecycleCommand::Resolve, AUTO_RESOLVE_ACTOR, now)?;
            }
            Ok(())
        })?;

        if !resolved {
            return Ok(Outcome::NotDue);
        }
        tracing::info!(alert_id = %open.id, obligation_id = %obligation.id, "alert auto-resolved");
        Ok(Outcome::AutoResolved { alert_id: open.id })
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }
}

fn log_failure(obligation: &MonitoredObligation, error: &VigilError) {
    match error {
        VigilError::Config(ConfigError::MissingRule { obligation_type }) => tracing::error!(
            obligation_id = %obligation.id,
            obligation_type = %obligation_type,
            "no alert rule configured for obligation type"
        ),
        _ => tracing::error!(
            obligation_id = %obligation.id,
            error = %error,
            "obligation evaluation failed"
        ),
    }
}
