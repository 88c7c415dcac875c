use chrono::{DateTime, Utc};

use crate::errors::VigilResult;
use crate::models::{
    AlertCursor, AlertFilter, AlertPage, AlertRule, AlertStatus, ComplianceAlert,
    NotificationLog, ObligationType, Severity,
};

/// Durable alert + rule persistence.
///
/// Implementations must make `update_alert` atomic per alert: the closure sees
/// the latest committed state and its changes commit all-or-nothing, with no
/// other writer touching that alert in between.
pub trait IAlertStore: Send + Sync {
    // --- Rules ---
    fn list_rules(&self) -> VigilResult<Vec<AlertRule>>;
    fn get_rule(&self, obligation_type: ObligationType) -> VigilResult<Option<AlertRule>>;
    fn upsert_rule(&self, rule: &AlertRule) -> VigilResult<()>;
    /// Insert only when no rule exists for the type. Returns true if inserted.
    fn insert_rule_if_absent(&self, rule: &AlertRule) -> VigilResult<bool>;

    // --- Alerts ---
    /// Fails with `StorageError::DuplicateOpenAlert` if an open alert already
    /// exists for the same obligation and type.
    fn create_alert(&self, alert: &ComplianceAlert) -> VigilResult<()>;
    fn get_alert(&self, id: &str) -> VigilResult<Option<ComplianceAlert>>;
    fn find_open_alert(
        &self,
        obligation_id: &str,
        obligation_type: ObligationType,
    ) -> VigilResult<Option<ComplianceAlert>>;
    /// Every alert matching `filter`, newest first.
    fn list_alerts(&self, filter: &AlertFilter) -> VigilResult<Vec<ComplianceAlert>>;
    /// Up to `limit` matching alerts after `after`, newest first. `limit` is
    /// clamped with `page_size`.
    fn list_alerts_page(
        &self,
        filter: &AlertFilter,
        after: Option<&AlertCursor>,
        limit: usize,
    ) -> VigilResult<AlertPage>;
    fn list_open_alerts(&self) -> VigilResult<Vec<ComplianceAlert>>;
    /// Read-modify-write one alert atomically. An `Err` from `f` rolls back.
    fn update_alert(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut ComplianceAlert) -> VigilResult<()>,
    ) -> VigilResult<ComplianceAlert>;
    /// Record delivery entries. An entry whose id already exists replaces the
    /// stored one, which is how pending entries settle. Allowed on terminal
    /// alerts: the records describe sends triggered while the alert was open.
    fn append_notifications(&self, alert_id: &str, logs: &[NotificationLog]) -> VigilResult<()>;
    /// Settle every still-pending entry as failed with `error`. Returns how
    /// many were settled.
    fn fail_pending_notifications(&self, error: &str, at: DateTime<Utc>) -> VigilResult<usize>;

    // --- Aggregation ---
    fn count_by_status(&self) -> VigilResult<Vec<(AlertStatus, usize)>>;
    fn count_open_by_severity(&self) -> VigilResult<Vec<(Severity, usize)>>;
}
