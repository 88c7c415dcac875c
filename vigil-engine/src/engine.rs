//! ComplianceEngine: the facade UI/API collaborators talk to.

use std::sync::Arc;

use vigil_core::config::VigilConfig;
use vigil_core::constants::ABANDONED_BEFORE_RESTART;
use vigil_core::errors::{VigilError, VigilResult};
use vigil_core::models::{
    AlertAction, AlertCursor, AlertFilter, AlertPage, AlertRule, AlertStats, ComplianceAlert,
    NewAction, NotificationLog,
};
use vigil_core::traits::{CancellationToken, Clock, IAlertStore, Notifier, ObligationSource, SystemClock};
use vigil_notify::NotificationDispatcher;
use vigil_storage::SqliteAlertStore;

use crate::catalog::RuleCatalog;
use crate::evaluation::{CycleReport, EvaluationScheduler};
use crate::lifecycle::AlertLifecycleController;
use crate::worker::{self, WorkerHandle};

pub struct ComplianceEngine {
    config: VigilConfig,
    store: Arc<dyn IAlertStore>,
    catalog: RuleCatalog,
    dispatcher: NotificationDispatcher,
    lifecycle: AlertLifecycleController,
    scheduler: Arc<EvaluationScheduler>,
}

impl ComplianceEngine {
    /// Wire the engine over an existing store. Seed rules from `config` are
    /// inserted for types without a rule, and notifications left pending by an
    /// earlier run are marked failed. Must be called inside a tokio runtime.
    pub fn new(
        config: VigilConfig,
        store: Arc<dyn IAlertStore>,
        source: Arc<dyn ObligationSource>,
        notifiers: Vec<Arc<dyn Notifier>>,
        clock: Arc<dyn Clock>,
    ) -> VigilResult<Self> {
        config.validate()?;
        let dispatcher = NotificationDispatcher::new(
            &config.notification,
            notifiers,
            Arc::clone(&store),
            Arc::clone(&clock),
        )?;
        let abandoned = store.fail_pending_notifications(ABANDONED_BEFORE_RESTART, clock.now())?;
        if abandoned > 0 {
            tracing::warn!(abandoned, "pending notifications from an earlier run marked failed");
        }
        let catalog = RuleCatalog::new(Arc::clone(&store));
        let seeded = catalog.seed_rules(config.rules.iter().cloned())?;
        if seeded > 0 {
            tracing::info!(seeded, "seeded alert rules from config");
        }

        let lifecycle =
            AlertLifecycleController::new(Arc::clone(&store), dispatcher.clone(), Arc::clone(&clock));
        let scheduler = Arc::new(EvaluationScheduler::new(
            source,
            Arc::clone(&store),
            dispatcher.clone(),
            clock,
            config.evaluation.run_escalation,
        ));

        Ok(Self {
            config,
            store,
            catalog,
            dispatcher,
            lifecycle,
            scheduler,
        })
    }

    /// Open the SQLite store named by `config.storage` on the system clock.
    pub fn open(
        config: VigilConfig,
        source: Arc<dyn ObligationSource>,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> VigilResult<Self> {
        let store = SqliteAlertStore::from_config(&config.storage)?;
        tracing::info!(db_path = %config.storage.db_path, "alert store opened");
        Self::new(config, Arc::new(store), source, notifiers, Arc::new(SystemClock))
    }

    // --- Queries ---

    pub fn list_alerts(&self, filter: &AlertFilter) -> VigilResult<Vec<ComplianceAlert>> {
        self.store.list_alerts(filter)
    }

    /// One newest-first page of matching alerts; pass the previous page's
    /// `next` to continue.
    pub fn list_alerts_page(
        &self,
        filter: &AlertFilter,
        after: Option<&AlertCursor>,
        limit: usize,
    ) -> VigilResult<AlertPage> {
        self.store.list_alerts_page(filter, after, limit)
    }

    pub fn get_alert(&self, id: &str) -> VigilResult<ComplianceAlert> {
        self.store
            .get_alert(id)?
            .ok_or_else(|| VigilError::alert_not_found(id))
    }

    pub fn stats(&self) -> VigilResult<AlertStats> {
        let by_status: std::collections::BTreeMap<_, _> =
            self.store.count_by_status()?.into_iter().collect();
        let open_by_severity = self.store.count_open_by_severity()?.into_iter().collect();
        Ok(AlertStats {
            total: by_status.values().sum(),
            by_status,
            open_by_severity,
        })
    }

    // --- Rules ---

    pub fn list_rules(&self) -> VigilResult<Vec<AlertRule>> {
        self.catalog.list_rules()
    }

    pub fn upsert_rule(&self, rule: &AlertRule) -> VigilResult<()> {
        self.catalog.upsert_rule(rule)
    }

    pub fn seed_rules(&self, rules: impl IntoIterator<Item = AlertRule>) -> VigilResult<usize> {
        self.catalog.seed_rules(rules)
    }

    // --- Lifecycle ---

    pub fn acknowledge(&self, alert_id: &str, actor: &str) -> VigilResult<ComplianceAlert> {
        self.lifecycle.acknowledge(alert_id, actor)
    }

    pub fn resolve(&self, alert_id: &str, actor: &str) -> VigilResult<ComplianceAlert> {
        self.lifecycle.resolve(alert_id, actor)
    }

    pub fn dismiss(&self, alert_id: &str, actor: &str) -> VigilResult<ComplianceAlert> {
        self.lifecycle.dismiss(alert_id, actor)
    }

    pub fn add_action(&self, alert_id: &str, action: NewAction) -> VigilResult<AlertAction> {
        self.lifecycle.add_action(alert_id, action)
    }

    pub fn start_action(&self, alert_id: &str, action_id: &str, actor: &str) -> VigilResult<AlertAction> {
        self.lifecycle.start_action(alert_id, action_id, actor)
    }

    pub fn complete_action(
        &self,
        alert_id: &str,
        action_id: &str,
        actor: &str,
    ) -> VigilResult<AlertAction> {
        self.lifecycle.complete_action(alert_id, action_id, actor)
    }

    pub async fn send_reminder(&self, alert_id: &str) -> VigilResult<Vec<NotificationLog>> {
        self.lifecycle.send_reminder(alert_id).await
    }

    // --- Evaluation ---

    /// Run one cycle on the calling thread. Blocks on the store; from async
    /// code prefer `spawn_worker` or `spawn_blocking`.
    pub fn run_cycle(&self) -> VigilResult<CycleReport> {
        self.scheduler.run_cycle(&CancellationToken::new())
    }

    pub fn spawn_worker(&self) -> WorkerHandle {
        worker::spawn_worker(
            Arc::clone(&self.scheduler),
            self.dispatcher.clone(),
            self.config.evaluation.interval(),
            self.config.notification.shutdown_grace(),
        )
    }

    /// Wait for background notifications to settle. False on timeout.
    pub async fn flush_notifications(&self, timeout: std::time::Duration) -> bool {
        self.dispatcher.flush(timeout).await
    }

    pub fn config(&self) -> &VigilConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn lifecycle(&self) -> &AlertLifecycleController {
        &self.lifecycle
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn scheduler(&self) -> &Arc<EvaluationScheduler> {
        &self.scheduler
    }
}
