//! Configuration errors, including missing or invalid alert rules.

use super::error_code::{self, VigilErrorCode};
use crate::models::ObligationType;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("invalid value for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("no alert rule configured for obligation type {obligation_type}")]
    MissingRule { obligation_type: ObligationType },

    #[error("invalid alert rule for {obligation_type}: {reason}")]
    InvalidRule {
        obligation_type: ObligationType,
        reason: String,
    },
}

impl VigilErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRule { .. } => error_code::MISSING_RULE,
            Self::InvalidRule { .. } => error_code::INVALID_RULE,
            _ => error_code::CONFIG_ERROR,
        }
    }
}
