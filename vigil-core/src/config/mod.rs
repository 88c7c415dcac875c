//! Configuration system for Vigil.
//! TOML-based, 3-layer resolution: env > project file > defaults.

pub mod defaults;
pub mod evaluation_config;
pub mod notification_config;
pub mod observability_config;
pub mod storage_config;
pub mod vigil_config;

pub use evaluation_config::EvaluationConfig;
pub use notification_config::NotificationConfig;
pub use observability_config::ObservabilityConfig;
pub use storage_config::StorageConfig;
pub use vigil_config::VigilConfig;
