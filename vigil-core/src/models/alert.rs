//! ComplianceAlert, the core mutable entity, and its lifecycle state machine.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::action::{ActionStatus, AlertAction, NewAction};
use super::notification::NotificationLog;
use super::obligation::{MonitoredObligation, ObligationType};
use super::severity::Severity;
use crate::errors::LifecycleError;

/// Lifecycle state. `Resolved` and `Dismissed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    pub const ALL: [AlertStatus; 4] = [
        Self::Active,
        Self::Acknowledged,
        Self::Resolved,
        Self::Dismissed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    pub fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::Acknowledged)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }

    /// Target state for a status-changing command, or `None` if the command
    /// is not a legal transition from `self`.
    pub fn next(self, command: LifecycleCommand) -> Option<AlertStatus> {
        use LifecycleCommand as C;
        match (self, command) {
            (Self::Active, C::Acknowledge) => Some(Self::Acknowledged),
            (Self::Active | Self::Acknowledged, C::Resolve) => Some(Self::Resolved),
            (Self::Active | Self::Acknowledged, C::Dismiss) => Some(Self::Dismissed),
            _ => None,
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands an operator (or the scheduler) can issue against an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleCommand {
    Acknowledge,
    Resolve,
    Dismiss,
    AddAction,
    StartAction,
    CompleteAction,
    SendReminder,
}

impl LifecycleCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acknowledge => "acknowledge",
            Self::Resolve => "resolve",
            Self::Dismiss => "dismiss",
            Self::AddAction => "add_action",
            Self::StartAction => "start_action",
            Self::CompleteAction => "complete_action",
            Self::SendReminder => "send_reminder",
        }
    }
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert raised for a monitored obligation.
///
/// At most one open alert exists per `(obligation_id, obligation_type)`.
/// `severity` and `days_until_expiry` track the live classification while open
/// and are frozen once the alert reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceAlert {
    pub id: String,
    pub obligation_id: String,
    pub obligation_type: ObligationType,
    pub owner: String,
    /// Derived once at creation.
    pub title: String,
    /// Derived once at creation.
    pub description: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub expiry_date: DateTime<Utc>,
    /// Negative when overdue.
    pub days_until_expiry: i64,
    pub assigned_to: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub dismissed_by: Option<String>,
    /// Set when escalation fires; compared against the current state epoch.
    pub last_escalated_at: Option<DateTime<Utc>>,
    pub actions: Vec<AlertAction>,
    pub notifications: Vec<NotificationLog>,
}

impl ComplianceAlert {
    /// Build a fresh `active` alert for an obligation.
    pub fn open(
        obligation: &MonitoredObligation,
        expiry_date: DateTime<Utc>,
        severity: Severity,
        days_until_expiry: i64,
        assigned_to: BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let label = obligation.obligation_type.label();
        let title = if days_until_expiry < 0 {
            format!("{label} overdue: {}", obligation.name)
        } else {
            format!("{label} expiring: {}", obligation.name)
        };
        let description = format!(
            "{label} '{}' held by {} expires on {} ({}).",
            obligation.name,
            obligation.owner,
            expiry_date.format("%Y-%m-%d"),
            describe_days(days_until_expiry),
        );

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            obligation_id: obligation.id.clone(),
            obligation_type: obligation.obligation_type,
            owner: obligation.owner.clone(),
            title,
            description,
            severity,
            status: AlertStatus::Active,
            expiry_date,
            days_until_expiry,
            assigned_to,
            created_at: now,
            updated_at: now,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolved_by: None,
            dismissed_at: None,
            dismissed_by: None,
            last_escalated_at: None,
            actions: Vec::new(),
            notifications: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Fail with `AlreadyTerminal` unless the alert is still open.
    pub fn ensure_open(&self, command: LifecycleCommand) -> Result<(), LifecycleError> {
        if self.status.is_terminal() {
            return Err(LifecycleError::AlreadyTerminal {
                alert_id: self.id.clone(),
                status: self.status,
                command,
            });
        }
        Ok(())
    }

    /// Apply a status-changing command, stamping the matching audit fields.
    pub fn apply(
        &mut self,
        command: LifecycleCommand,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        require_actor(command, actor)?;
        self.ensure_open(command)?;
        let next = self
            .status
            .next(command)
            .ok_or_else(|| LifecycleError::InvalidTransition {
                alert_id: self.id.clone(),
                from: self.status,
                command,
            })?;

        match next {
            AlertStatus::Acknowledged => {
                self.acknowledged_at = Some(now);
                self.acknowledged_by = Some(actor.to_string());
            }
            AlertStatus::Resolved => {
                self.resolved_at = Some(now);
                self.resolved_by = Some(actor.to_string());
            }
            AlertStatus::Dismissed => {
                self.dismissed_at = Some(now);
                self.dismissed_by = Some(actor.to_string());
            }
            AlertStatus::Active => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Refresh the live classification. Returns the previous severity.
    /// A no-op on terminal alerts, whose severity is frozen.
    pub fn record_evaluation(
        &mut self,
        severity: Severity,
        days_until_expiry: i64,
        expiry_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Severity {
        let previous = self.severity;
        if self.status.is_terminal() {
            return previous;
        }
        if previous != severity
            || self.days_until_expiry != days_until_expiry
            || self.expiry_date != expiry_date
        {
            self.severity = severity;
            self.days_until_expiry = days_until_expiry;
            self.expiry_date = expiry_date;
            self.updated_at = now;
        }
        previous
    }

    /// Start of the current state epoch: acknowledgement time while
    /// acknowledged, creation time otherwise.
    pub fn state_epoch_start(&self) -> DateTime<Utc> {
        match (self.status, self.acknowledged_at) {
            (AlertStatus::Acknowledged, Some(at)) => at,
            _ => self.created_at,
        }
    }

    /// Whether escalation should fire now: open, aged past the policy, and not
    /// already escalated within the current state epoch.
    pub fn escalation_due(&self, escalate_after_days: u32, now: DateTime<Utc>) -> bool {
        if !self.is_open() {
            return false;
        }
        let epoch = self.state_epoch_start();
        let aged = now - epoch >= Duration::days(i64::from(escalate_after_days));
        // Strictly after: an acknowledgement stamped at the escalation instant
        // opens a new epoch.
        let fired_this_epoch = self.last_escalated_at.is_some_and(|at| at > epoch);
        aged && !fired_this_epoch
    }

    pub fn add_action(
        &mut self,
        action: NewAction,
        now: DateTime<Utc>,
    ) -> Result<AlertAction, LifecycleError> {
        self.ensure_open(LifecycleCommand::AddAction)?;
        let action = action.into_action(now);
        self.actions.push(action.clone());
        self.updated_at = now;
        Ok(action)
    }

    /// `pending -> in-progress`.
    pub fn start_action(
        &mut self,
        action_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<AlertAction, LifecycleError> {
        let command = LifecycleCommand::StartAction;
        require_actor(command, actor)?;
        self.ensure_open(command)?;
        let alert_id = self.id.clone();
        let action = self.action_mut(action_id)?;
        if action.status != ActionStatus::Pending {
            return Err(LifecycleError::InvalidActionTransition {
                alert_id,
                action_id: action_id.to_string(),
                from: action.status,
                command,
            });
        }
        action.status = ActionStatus::InProgress;
        let snapshot = action.clone();
        self.updated_at = now;
        Ok(snapshot)
    }

    /// `pending | in-progress -> completed`.
    pub fn complete_action(
        &mut self,
        action_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<AlertAction, LifecycleError> {
        let command = LifecycleCommand::CompleteAction;
        require_actor(command, actor)?;
        self.ensure_open(command)?;
        let alert_id = self.id.clone();
        let action = self.action_mut(action_id)?;
        if action.status == ActionStatus::Completed {
            return Err(LifecycleError::InvalidActionTransition {
                alert_id,
                action_id: action_id.to_string(),
                from: action.status,
                command,
            });
        }
        action.status = ActionStatus::Completed;
        action.completed_at = Some(now);
        action.completed_by = Some(actor.to_string());
        let snapshot = action.clone();
        self.updated_at = now;
        Ok(snapshot)
    }

    fn action_mut(&mut self, action_id: &str) -> Result<&mut AlertAction, LifecycleError> {
        let alert_id = self.id.clone();
        self.actions
            .iter_mut()
            .find(|a| a.id == action_id)
            .ok_or_else(|| LifecycleError::ActionNotFound {
                alert_id,
                action_id: action_id.to_string(),
            })
    }
}

fn require_actor(command: LifecycleCommand, actor: &str) -> Result<(), LifecycleError> {
    if actor.trim().is_empty() {
        return Err(LifecycleError::MissingActor { command });
    }
    Ok(())
}

fn describe_days(days: i64) -> String {
    match days {
        d if d < 0 => format!("{} day(s) overdue", -d),
        0 => "expires today".to_string(),
        d => format!("{d} day(s) remaining"),
    }
}
