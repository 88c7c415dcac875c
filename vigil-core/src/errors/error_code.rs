//! Stable, machine-readable error codes surfaced to API collaborators.

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const MISSING_RULE: &str = "MISSING_RULE";
pub const INVALID_RULE: &str = "INVALID_RULE";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DUPLICATE_OPEN_ALERT: &str = "DUPLICATE_OPEN_ALERT";
pub const EVALUATION_ERROR: &str = "EVALUATION_ERROR";
pub const SOURCE_UNAVAILABLE: &str = "SOURCE_UNAVAILABLE";
pub const CANCELLED: &str = "CANCELLED";
pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
pub const ALREADY_TERMINAL: &str = "ALREADY_TERMINAL";
pub const MISSING_ACTOR: &str = "MISSING_ACTOR";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const NOTIFICATION_FAILURE: &str = "NOTIFICATION_FAILURE";

/// Implemented by every error enum in the workspace.
pub trait VigilErrorCode {
    fn error_code(&self) -> &'static str;
}
