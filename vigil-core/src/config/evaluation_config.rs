use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Evaluation scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Seconds between evaluation cycles.
    pub interval_secs: u64,
    /// Run the escalation pass after each cycle.
    pub run_escalation: bool,
}

impl EvaluationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::DEFAULT_EVALUATION_INTERVAL_SECS,
            run_escalation: defaults::DEFAULT_RUN_ESCALATION,
        }
    }
}
