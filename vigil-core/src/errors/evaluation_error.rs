//! Errors raised while classifying and reconciling a single obligation.

use super::error_code::{self, VigilErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("obligation {obligation_id} has no expiry date")]
    MissingExpiry { obligation_id: String },

    #[error("obligation source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("evaluation cycle cancelled")]
    Cancelled,
}

impl VigilErrorCode for EvaluationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingExpiry { .. } => error_code::EVALUATION_ERROR,
            Self::SourceUnavailable { .. } => error_code::SOURCE_UNAVAILABLE,
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}
