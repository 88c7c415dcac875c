use std::fs;
use std::path::{Path, PathBuf};

use vigil_core::errors::{EvaluationError, VigilResult};
use vigil_core::models::MonitoredObligation;
use vigil_core::traits::ObligationSource;

/// Reads a JSON array of obligations from disk on every call, so edits to the
/// file are picked up by the next cycle without a restart.
#[derive(Debug, Clone)]
pub struct JsonFileObligationSource {
    path: PathBuf,
}

impl JsonFileObligationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, message: impl std::fmt::Display) -> EvaluationError {
        EvaluationError::SourceUnavailable {
            message: format!("{}: {message}", self.path.display()),
        }
    }
}

impl ObligationSource for JsonFileObligationSource {
    fn list_obligations(&self) -> VigilResult<Vec<MonitoredObligation>> {
        let content = fs::read_to_string(&self.path).map_err(|e| self.unavailable(e))?;
        let obligations: Vec<MonitoredObligation> =
            serde_json::from_str(&content).map_err(|e| self.unavailable(e))?;
        tracing::debug!(path = %self.path.display(), count = obligations.len(), "obligations loaded");
        Ok(obligations)
    }
}

#[cfg(test)]
mod tests {
    use vigil_core::errors::VigilErrorCode;
    use vigil_core::models::ObligationType;

    use super::*;

    #[test]
    fn reads_obligation_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obligations.json");
        fs::write(
            &path,
            r#"[
                {"id": "whs-1", "obligation_type": "whs-audit", "name": "Depot audit",
                 "expiry_date": "2026-04-01T00:00:00Z", "owner": "site-4"},
                {"id": "mou-9", "obligation_type": "mou-expiry", "name": "Clinic MoU",
                 "expiry_date": null, "owner": "partner-2"}
            ]"#,
        )
        .unwrap();

        let list = JsonFileObligationSource::new(&path).list_obligations().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].obligation_type, ObligationType::WhsAudit);
        assert!(list[1].expiry_date.is_none());
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonFileObligationSource::new(dir.path().join("absent.json"))
            .list_obligations()
            .unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_UNAVAILABLE");
    }

    #[test]
    fn malformed_json_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obligations.json");
        fs::write(&path, "{not json").unwrap();
        let err = JsonFileObligationSource::new(&path).list_obligations().unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_UNAVAILABLE");
    }
}
