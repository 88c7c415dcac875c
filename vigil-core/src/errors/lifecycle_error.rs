//! State-machine violations. Always returned to the caller, never swallowed.

use super::error_code::{self, VigilErrorCode};
use crate::models::{ActionStatus, AlertStatus, LifecycleCommand};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("alert {alert_id} is already {status}; cannot {command}")]
    AlreadyTerminal {
        alert_id: String,
        status: AlertStatus,
        command: LifecycleCommand,
    },

    #[error("cannot {command} alert {alert_id} from state {from}")]
    InvalidTransition {
        alert_id: String,
        from: AlertStatus,
        command: LifecycleCommand,
    },

    #[error("cannot {command} action {action_id} on alert {alert_id}: action is {from}")]
    InvalidActionTransition {
        alert_id: String,
        action_id: String,
        from: ActionStatus,
        command: LifecycleCommand,
    },

    #[error("action {action_id} not found on alert {alert_id}")]
    ActionNotFound { alert_id: String, action_id: String },

    #[error("{command} requires an actor identity")]
    MissingActor { command: LifecycleCommand },
}

impl VigilErrorCode for LifecycleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyTerminal { .. } => error_code::ALREADY_TERMINAL,
            Self::InvalidTransition { .. } | Self::InvalidActionTransition { .. } => {
                error_code::INVALID_TRANSITION
            }
            Self::ActionNotFound { .. } => error_code::NOT_FOUND,
            Self::MissingActor { .. } => error_code::MISSING_ACTOR,
        }
    }
}
