//! AlertLifecycleController: operator commands against a single alert.
//!
//! Every command is a read-modify-write inside `IAlertStore::update_alert`,
//! so concurrent commands on one alert serialize and an invalid transition
//! leaves the stored alert untouched.

use std::sync::Arc;

use vigil_core::errors::{LifecycleError, VigilError, VigilResult};
use vigil_core::models::{
    AlertAction, ComplianceAlert, LifecycleCommand, NewAction, NotificationKind, NotificationLog,
};
use vigil_core::traits::{Clock, IAlertStore};
use vigil_notify::{NotificationDispatcher, NotificationJob};

use crate::catalog::RuleCatalog;

#[derive(Clone)]
pub struct AlertLifecycleController {
    store: Arc<dyn IAlertStore>,
    catalog: RuleCatalog,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl AlertLifecycleController {
    pub fn new(
        store: Arc<dyn IAlertStore>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog: RuleCatalog::new(Arc::clone(&store)),
            store,
            dispatcher,
            clock,
        }
    }

    /// `active -> acknowledged`. Restarts the escalation clock.
    pub fn acknowledge(&self, alert_id: &str, actor: &str) -> VigilResult<ComplianceAlert> {
        self.transition(alert_id, LifecycleCommand::Acknowledge, actor)
    }

    /// `active | acknowledged -> resolved`.
    pub fn resolve(&self, alert_id: &str, actor: &str) -> VigilResult<ComplianceAlert> {
        self.transition(alert_id, LifecycleCommand::Resolve, actor)
    }

    /// `active | acknowledged -> dismissed`.
    pub fn dismiss(&self, alert_id: &str, actor: &str) -> VigilResult<ComplianceAlert> {
        self.transition(alert_id, LifecycleCommand::Dismiss, actor)
    }

    fn transition(
        &self,
        alert_id: &str,
        command: LifecycleCommand,
        actor: &str,
    ) -> VigilResult<ComplianceAlert> {
        let _span = vigil_core::lifecycle_span!(alert_id, command).entered();
        let now = self.clock.now();
        let updated = self.store.update_alert(alert_id, &mut |a| {
            a.apply(command, actor, now)?;
            Ok(())
        });
        match &updated {
            Ok(alert) => tracing::info!(status = %alert.status, actor, "alert transitioned"),
            Err(e) => tracing::warn!(error = %e, "lifecycle command rejected"),
        }
        updated
    }

    pub fn add_action(&self, alert_id: &str, action: NewAction) -> VigilResult<AlertAction> {
        let _span = vigil_core::lifecycle_span!(alert_id, LifecycleCommand::AddAction).entered();
        let now = self.clock.now();
        let mut added = None;
        let mut pending = Some(action);
        self.store.update_alert(alert_id, &mut |a| {
            if let Some(action) = pending.take() {
                added = Some(a.add_action(action, now)?);
            }
            Ok(())
        })?;
        let added = added.ok_or_else(|| VigilError::alert_not_found(alert_id))?;
        tracing::info!(action_id = %added.id, assignee = %added.assignee, "action added");
        Ok(added)
    }

    pub fn start_action(
        &self,
        alert_id: &str,
        action_id: &str,
        actor: &str,
    ) -> VigilResult<AlertAction> {
        self.action_command(alert_id, action_id, actor, LifecycleCommand::StartAction)
    }

    pub fn complete_action(
        &self,
        alert_id: &str,
        action_id: &str,
        actor: &str,
    ) -> VigilResult<AlertAction> {
        self.action_command(alert_id, action_id, actor, LifecycleCommand::CompleteAction)
    }

    fn action_command(
        &self,
        alert_id: &str,
        action_id: &str,
        actor: &str,
        command: LifecycleCommand,
    ) -> VigilResult<AlertAction> {
        let _span = vigil_core::lifecycle_span!(alert_id, command).entered();
        let now = self.clock.now();
        let mut changed = None;
        self.store.update_alert(alert_id, &mut |a| {
            let action = match command {
                LifecycleCommand::StartAction => a.start_action(action_id, actor, now)?,
                _ => a.complete_action(action_id, actor, now)?,
            };
            changed = Some(action);
            Ok(())
        })?;
        let changed = changed.ok_or_else(|| LifecycleError::ActionNotFound {
            alert_id: alert_id.to_string(),
            action_id: action_id.to_string(),
        })?;
        tracing::info!(action_id, status = %changed.status, actor, "action updated");
        Ok(changed)
    }

    /// Re-notify the assignees and the rule's recipients of an open alert.
    /// Waits for delivery, records the logs on the alert and returns them.
    pub async fn send_reminder(&self, alert_id: &str) -> VigilResult<Vec<NotificationLog>> {
        let alert = self
            .store
            .get_alert(alert_id)?
            .ok_or_else(|| VigilError::alert_not_found(alert_id))?;
        alert.ensure_open(LifecycleCommand::SendReminder)?;
        let rule = self.catalog.get_rule(alert.obligation_type)?;

        let recipients = alert
            .assigned_to
            .iter()
            .chain(rule.notification_settings.recipients.iter())
            .cloned();
        let job = NotificationJob::new(
            &alert,
            NotificationKind::Reminder,
            rule.notification_settings.channels.clone(),
            recipients,
        );

        let logs = self.dispatcher.dispatch(job).await;
        self.store.append_notifications(alert_id, &logs)?;
        tracing::info!(
            alert_id,
            sent = logs.iter().filter(|l| !l.is_failed()).count(),
            failed = logs.iter().filter(|l| l.is_failed()).count(),
            "reminder sent"
        );
        Ok(logs)
    }
}
