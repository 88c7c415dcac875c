//! Top-level Vigil configuration with 3-layer resolution.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{EvaluationConfig, NotificationConfig, ObservabilityConfig, StorageConfig};
use crate::errors::ConfigError;
use crate::models::AlertRule;

/// Name of the project config file looked up by [`VigilConfig::load`].
pub const CONFIG_FILE_NAME: &str = "vigil.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`VIGIL_*`)
/// 2. Project config (`vigil.toml` in the given root)
/// 3. Compiled defaults
///
/// `rules` are seed rules: they are written to the store only for
/// obligation types that have no rule yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VigilConfig {
    pub evaluation: EvaluationConfig,
    pub notification: NotificationConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
    pub rules: Vec<AlertRule>,
}

impl VigilConfig {
    /// Load configuration from `root/vigil.toml`, then environment, then validate.
    /// A missing project file is not an error.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        Self::apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Unknown keys are ignored.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &str, ok: bool) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must be greater than 0".to_string(),
                })
            }
        }

        positive("evaluation.interval_secs", self.evaluation.interval_secs > 0)?;

        let n = &self.notification;
        positive("notification.max_attempts", n.max_attempts > 0)?;
        positive("notification.initial_backoff_ms", n.initial_backoff_ms > 0)?;
        positive("notification.send_timeout_ms", n.send_timeout_ms > 0)?;
        positive("notification.max_concurrent_sends", n.max_concurrent_sends > 0)?;
        positive("notification.backoff_multiplier", n.backoff_multiplier > 0)?;
        if n.max_backoff_ms < n.initial_backoff_ms {
            return Err(ConfigError::ValidationFailed {
                field: "notification.max_backoff_ms".to_string(),
                message: "must be >= notification.initial_backoff_ms".to_string(),
            });
        }

        positive("storage.read_pool_size", self.storage.read_pool_size > 0)?;
        if self.storage.db_path.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "storage.db_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            rule.validate()?;
            if !seen.insert(rule.obligation_type) {
                return Err(ConfigError::InvalidRule {
                    obligation_type: rule.obligation_type,
                    reason: "duplicate rule for obligation type".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    /// Pattern: `VIGIL_EVALUATION_INTERVAL_SECS`, `VIGIL_STORAGE_DB_PATH`, etc.
    /// Unparseable values are ignored.
    fn apply_env_overrides(config: &mut VigilConfig) {
        if let Some(v) = env_parse::<u64>("VIGIL_EVALUATION_INTERVAL_SECS") {
            config.evaluation.interval_secs = v;
        }
        if let Some(v) = env_parse::<bool>("VIGIL_EVALUATION_RUN_ESCALATION") {
            config.evaluation.run_escalation = v;
        }
        if let Some(v) = env_parse::<u32>("VIGIL_NOTIFICATION_MAX_ATTEMPTS") {
            config.notification.max_attempts = v;
        }
        if let Some(v) = env_parse::<u64>("VIGIL_NOTIFICATION_SEND_TIMEOUT_MS") {
            config.notification.send_timeout_ms = v;
        }
        if let Some(v) = env_parse::<usize>("VIGIL_NOTIFICATION_MAX_CONCURRENT_SENDS") {
            config.notification.max_concurrent_sends = v;
        }
        if let Ok(v) = std::env::var("VIGIL_STORAGE_DB_PATH") {
            config.storage.db_path = v;
        }
        if let Some(v) = env_parse::<usize>("VIGIL_STORAGE_READ_POOL_SIZE") {
            config.storage.read_pool_size = v;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
