//! Top-level error aggregating every subsystem error via `From` conversions.

use super::error_code::{self, VigilErrorCode};
use super::{ConfigError, EvaluationError, LifecycleError, NotificationError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

pub type VigilResult<T> = Result<T, VigilError>;

impl VigilError {
    pub fn alert_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "alert",
            id: id.into(),
        }
    }

    /// True for `NotFound` and the lifecycle equivalent for actions.
    pub fn is_not_found(&self) -> bool {
        self.error_code() == error_code::NOT_FOUND
    }

    pub fn is_already_terminal(&self) -> bool {
        matches!(self, Self::Lifecycle(LifecycleError::AlreadyTerminal { .. }))
    }
}

impl VigilErrorCode for VigilError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Evaluation(e) => e.error_code(),
            Self::Lifecycle(e) => e.error_code(),
            Self::Notification(e) => e.error_code(),
            Self::NotFound { .. } => error_code::NOT_FOUND,
        }
    }
}
