//! Remediation tasks attached to an alert.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [Self::Pending, Self::InProgress, Self::Completed]
            .into_iter()
            .find(|v| v.as_str() == s)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A follow-up task raised against an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertAction {
    pub id: String,
    pub description: String,
    pub assignee: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: ActionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
}

/// Caller-supplied fields for a new action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAction {
    pub description: String,
    pub assignee: String,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewAction {
    pub fn new(description: impl Into<String>, assignee: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            assignee: assignee.into(),
            due_date: None,
        }
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub(crate) fn into_action(self, now: DateTime<Utc>) -> AlertAction {
        AlertAction {
            id: uuid::Uuid::new_v4().to_string(),
            description: self.description,
            assignee: self.assignee,
            due_date: self.due_date,
            status: ActionStatus::Pending,
            created_at: now,
            completed_at: None,
            completed_by: None,
        }
    }
}
