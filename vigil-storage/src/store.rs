//! `SqliteAlertStore`: the SQLite-backed `IAlertStore`.

use std::path::Path;

use chrono::{DateTime, Utc};

use vigil_core::config::StorageConfig;
use vigil_core::errors::{VigilError, VigilResult};
use vigil_core::models::{
    AlertCursor, AlertFilter, AlertPage, AlertRule, AlertStatus, ComplianceAlert,
    NotificationLog, ObligationType, Severity,
};
use vigil_core::traits::IAlertStore;

use crate::connection::DatabaseManager;
use crate::queries::{alerts, notifications, rules};

/// Reads go through the pool; every write runs in a BEGIN IMMEDIATE
/// transaction on the single writer, so writers to the same alert never
/// interleave.
pub struct SqliteAlertStore {
    db: DatabaseManager,
}

impl SqliteAlertStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    pub fn open(path: &Path, read_pool_size: usize) -> VigilResult<Self> {
        Ok(Self::new(DatabaseManager::open(path, read_pool_size)?))
    }

    pub fn from_config(config: &StorageConfig) -> VigilResult<Self> {
        Ok(Self::new(DatabaseManager::from_config(config)?))
    }

    pub fn open_in_memory() -> VigilResult<Self> {
        Ok(Self::new(DatabaseManager::open_in_memory()?))
    }
}

impl IAlertStore for SqliteAlertStore {
    fn list_rules(&self) -> VigilResult<Vec<AlertRule>> {
        self.db.with_reader(rules::list_rules)
    }

    fn get_rule(&self, obligation_type: ObligationType) -> VigilResult<Option<AlertRule>> {
        self.db.with_reader(|conn| rules::get_rule(conn, obligation_type))
    }

    fn upsert_rule(&self, rule: &AlertRule) -> VigilResult<()> {
        self.db.with_transaction(|tx| rules::upsert_rule(tx, rule))
    }

    fn insert_rule_if_absent(&self, rule: &AlertRule) -> VigilResult<bool> {
        self.db.with_transaction(|tx| rules::insert_rule_if_absent(tx, rule))
    }

    fn create_alert(&self, alert: &ComplianceAlert) -> VigilResult<()> {
        self.db.with_transaction(|tx| alerts::insert_alert(tx, alert))
    }

    fn get_alert(&self, id: &str) -> VigilResult<Option<ComplianceAlert>> {
        self.db.with_reader(|conn| alerts::get_alert(conn, id))
    }

    fn find_open_alert(
        &self,
        obligation_id: &str,
        obligation_type: ObligationType,
    ) -> VigilResult<Option<ComplianceAlert>> {
        self.db
            .with_reader(|conn| alerts::find_open_alert(conn, obligation_id, obligation_type))
    }

    fn list_alerts(&self, filter: &AlertFilter) -> VigilResult<Vec<ComplianceAlert>> {
        self.db.with_reader(|conn| alerts::list_alerts(conn, filter))
    }

    fn list_alerts_page(
        &self,
        filter: &AlertFilter,
        after: Option<&AlertCursor>,
        limit: usize,
    ) -> VigilResult<AlertPage> {
        self.db
            .with_reader(|conn| alerts::list_alerts_page(conn, filter, after, limit))
    }

    fn list_open_alerts(&self) -> VigilResult<Vec<ComplianceAlert>> {
        self.db.with_reader(alerts::list_open_alerts)
    }

    fn update_alert(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut ComplianceAlert) -> VigilResult<()>,
    ) -> VigilResult<ComplianceAlert> {
        self.db.with_transaction(|tx| {
            let mut alert =
                alerts::get_alert(tx, id)?.ok_or_else(|| VigilError::alert_not_found(id))?;
            f(&mut alert)?;
            alerts::update_alert(tx, &alert)?;
            Ok(alert)
        })
    }

    fn append_notifications(&self, alert_id: &str, logs: &[NotificationLog]) -> VigilResult<()> {
        if logs.is_empty() {
            return Ok(());
        }
        self.db.with_transaction(|tx| {
            if !alerts::alert_exists(tx, alert_id)? {
                return Err(VigilError::alert_not_found(alert_id));
            }
            notifications::upsert_notifications(tx, alert_id, logs)
        })
    }

    fn fail_pending_notifications(&self, error: &str, at: DateTime<Utc>) -> VigilResult<usize> {
        self.db
            .with_transaction(|tx| notifications::fail_pending(tx, error, &at))
    }

    fn count_by_status(&self) -> VigilResult<Vec<(AlertStatus, usize)>> {
        self.db.with_reader(alerts::count_by_status)
    }

    fn count_open_by_severity(&self) -> VigilResult<Vec<(Severity, usize)>> {
        self.db.with_reader(alerts::count_open_by_severity)
    }
}
