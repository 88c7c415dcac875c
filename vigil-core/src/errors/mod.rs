//! Error handling for Vigil.
//! One error enum per subsystem, `thiserror` only, aggregated by `VigilError`.

pub mod config_error;
pub mod error_code;
pub mod evaluation_error;
pub mod lifecycle_error;
pub mod notification_error;
pub mod storage_error;
pub mod vigil_error;

pub use config_error::ConfigError;
pub use error_code::VigilErrorCode;
pub use evaluation_error::EvaluationError;
pub use lifecycle_error::LifecycleError;
pub use notification_error::NotificationError;
pub use storage_error::StorageError;
pub use vigil_error::{VigilError, VigilResult};
