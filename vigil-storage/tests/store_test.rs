//! Integration tests for the SQLite alert store.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use vigil_core::errors::{StorageError, VigilError, VigilResult};
use vigil_core::models::{
    AlertFilter, AlertRule, AlertStatus, Channel, ComplianceAlert, DeliveryStatus,
    EscalationPolicy, LifecycleCommand, MonitoredObligation, NewAction, NotificationKind,
    NotificationLog, NotificationSettings, ObligationType, Severity, SeverityThresholds,
};
use vigil_core::traits::IAlertStore;
use vigil_storage::SqliteAlertStore;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
}

fn rule(obligation_type: ObligationType) -> AlertRule {
    AlertRule {
        obligation_type,
        thresholds: SeverityThresholds::default(),
        notification_settings: NotificationSettings {
            channels: BTreeSet::from([Channel::Email, Channel::InApp]),
            recipients: vec!["compliance-officer".into()],
        },
        escalation: EscalationPolicy {
            escalate_after_days: 3,
            escalate_to: vec!["compliance-manager".into()],
        },
        is_active: true,
    }
}

fn alert_for(obligation_id: &str, severity: Severity, days: i64) -> ComplianceAlert {
    let expiry = t0() + Duration::days(days);
    let ob = MonitoredObligation::new(
        obligation_id,
        ObligationType::Insurance,
        "Public liability policy",
        expiry,
        "contractor-12",
    );
    ComplianceAlert::open(
        &ob,
        expiry,
        severity,
        days,
        BTreeSet::from(["compliance-officer".to_string()]),
        t0(),
    )
}

fn log_for(alert_id: &str, status: DeliveryStatus) -> NotificationLog {
    NotificationLog {
        id: uuid::Uuid::new_v4().to_string(),
        alert_id: alert_id.to_string(),
        kind: NotificationKind::Initial,
        channel: Channel::Email,
        recipient: "compliance-officer".into(),
        sent_at: t0(),
        status,
        attempts: 1,
        message: "Insurance expiring".into(),
        error: None,
    }
}

#[test]
fn rule_upsert_and_seed_semantics() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let mut r = rule(ObligationType::WhsAudit);

    assert!(store.insert_rule_if_absent(&r).unwrap());
    r.thresholds = SeverityThresholds::new(3, 7, 14, 30);
    // Seeding never overwrites.
    assert!(!store.insert_rule_if_absent(&r).unwrap());
    assert_eq!(
        store.get_rule(ObligationType::WhsAudit).unwrap().unwrap().thresholds,
        SeverityThresholds::default()
    );

    store.upsert_rule(&r).unwrap();
    let loaded = store.get_rule(ObligationType::WhsAudit).unwrap().unwrap();
    assert_eq!(loaded, r);
    assert!(store.get_rule(ObligationType::Insurance).unwrap().is_none());
    assert_eq!(store.list_rules().unwrap().len(), 1);
}

#[test]
fn alert_roundtrip_preserves_children() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let mut alert = alert_for("ins-1", Severity::High, 12);
    alert
        .add_action(NewAction::new("Request renewed certificate", "ops").due(t0() + Duration::days(5)), t0())
        .unwrap();
    alert.notifications.push(log_for(&alert.id, DeliveryStatus::Sent));

    store.create_alert(&alert).unwrap();
    let loaded = store.get_alert(&alert.id).unwrap().unwrap();
    assert_eq!(loaded, alert);
}

#[test]
fn second_open_alert_for_same_obligation_is_rejected() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let first = alert_for("ins-1", Severity::High, 12);
    store.create_alert(&first).unwrap();

    let err = store
        .create_alert(&alert_for("ins-1", Severity::Critical, 2))
        .unwrap_err();
    assert!(matches!(
        err,
        VigilError::Storage(StorageError::DuplicateOpenAlert { .. })
    ));

    // Once the first is terminal a new open alert is allowed.
    store
        .update_alert(&first.id, &mut |a| {
            a.apply(LifecycleCommand::Resolve, "officer", t0())?;
            Ok(())
        })
        .unwrap();
    store
        .create_alert(&alert_for("ins-1", Severity::Critical, 2))
        .unwrap();
    assert_eq!(store.list_alerts(&AlertFilter::new().with_obligation("ins-1")).unwrap().len(), 2);
}

#[test]
fn failed_update_rolls_back() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let alert = alert_for("ins-2", Severity::Medium, 20);
    store.create_alert(&alert).unwrap();

    let result: VigilResult<ComplianceAlert> = store.update_alert(&alert.id, &mut |a| {
        a.apply(LifecycleCommand::Acknowledge, "officer", t0())?;
        a.apply(LifecycleCommand::Acknowledge, "officer", t0())?;
        Ok(())
    });
    assert!(result.is_err());

    let loaded = store.get_alert(&alert.id).unwrap().unwrap();
    assert_eq!(loaded.status, AlertStatus::Active);
    assert!(loaded.acknowledged_at.is_none());
}

#[test]
fn update_of_unknown_alert_is_not_found() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let err = store.update_alert("missing", &mut |_| Ok(())).unwrap_err();
    assert!(err.is_not_found());
    let err = store
        .append_notifications("missing", &[log_for("missing", DeliveryStatus::Sent)])
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn notifications_append_to_terminal_alerts() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let alert = alert_for("ins-3", Severity::Low, 50);
    store.create_alert(&alert).unwrap();
    store
        .update_alert(&alert.id, &mut |a| {
            a.apply(LifecycleCommand::Dismiss, "officer", t0())?;
            Ok(())
        })
        .unwrap();

    let mut failed = log_for(&alert.id, DeliveryStatus::Failed);
    failed.error = Some("smtp 421".into());
    failed.attempts = 3;
    store
        .append_notifications(&alert.id, &[log_for(&alert.id, DeliveryStatus::Delivered), failed.clone()])
        .unwrap();

    let loaded = store.get_alert(&alert.id).unwrap().unwrap();
    assert_eq!(loaded.status, AlertStatus::Dismissed);
    assert_eq!(loaded.notifications.len(), 2);
    assert!(loaded.notifications.contains(&failed));
}

#[test]
fn filters_and_counts() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let a = alert_for("ins-a", Severity::Critical, 3);
    let b = alert_for("ins-b", Severity::High, 10);
    let c = alert_for("ins-c", Severity::High, 11);
    for alert in [&a, &b, &c] {
        store.create_alert(alert).unwrap();
    }
    store
        .update_alert(&c.id, &mut |x| {
            x.apply(LifecycleCommand::Resolve, "officer", t0())?;
            Ok(())
        })
        .unwrap();

    let high = store
        .list_alerts(&AlertFilter::new().with_severity(Severity::High))
        .unwrap();
    assert_eq!(high.len(), 2);
    let open_high = store
        .list_alerts(
            &AlertFilter::new()
                .with_severity(Severity::High)
                .with_status(AlertStatus::Active),
        )
        .unwrap();
    assert_eq!(open_high.len(), 1);
    assert_eq!(open_high[0].id, b.id);

    assert_eq!(store.list_open_alerts().unwrap().len(), 2);
    assert!(store
        .find_open_alert("ins-c", ObligationType::Insurance)
        .unwrap()
        .is_none());

    let by_status: Vec<_> = store.count_by_status().unwrap();
    assert!(by_status.contains(&(AlertStatus::Active, 2)));
    assert!(by_status.contains(&(AlertStatus::Resolved, 1)));
    let by_severity = store.count_open_by_severity().unwrap();
    assert!(by_severity.contains(&(Severity::Critical, 1)));
    assert!(by_severity.contains(&(Severity::High, 1)));
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("vigil.db");
    let alert = alert_for("ins-9", Severity::Medium, 25);
    {
        let store = SqliteAlertStore::open(&path, 2).unwrap();
        store.upsert_rule(&rule(ObligationType::Insurance)).unwrap();
        store.create_alert(&alert).unwrap();
    }

    let store = SqliteAlertStore::open(&path, 2).unwrap();
    assert_eq!(store.get_alert(&alert.id).unwrap().unwrap(), alert);
    assert!(store.get_rule(ObligationType::Insurance).unwrap().is_some());
}

#[test]
fn concurrent_updates_to_one_alert_serialize() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(SqliteAlertStore::open(&dir.path().join("vigil.db"), 4).unwrap());
    let alert = alert_for("ins-10", Severity::High, 9);
    store.create_alert(&alert).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            let id = alert.id.clone();
            std::thread::spawn(move || {
                store
                    .update_alert(&id, &mut |a| {
                        a.add_action(NewAction::new(format!("task {i}"), "ops"), t0())?;
                        Ok(())
                    })
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let loaded = store.get_alert(&alert.id).unwrap().unwrap();
    assert_eq!(loaded.actions.len(), 8);
}

#[test]
fn pending_entry_settles_in_place() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let mut alert = alert_for("ins-11", Severity::High, 9);
    let mut pending = log_for(&alert.id, DeliveryStatus::Pending);
    pending.attempts = 0;
    alert.notifications.push(pending.clone());
    store.create_alert(&alert).unwrap();

    let mut settled = pending.clone();
    settled.status = DeliveryStatus::Sent;
    settled.attempts = 2;
    settled.sent_at = t0() + Duration::seconds(4);
    let mut retried = log_for(&alert.id, DeliveryStatus::Failed);
    retried.error = Some("smtp 421".into());
    store
        .append_notifications(&alert.id, &[retried.clone(), settled.clone()])
        .unwrap();

    let loaded = store.get_alert(&alert.id).unwrap().unwrap();
    assert_eq!(loaded.notifications.len(), 2);
    assert!(loaded.notifications.contains(&settled));
    assert!(loaded.notifications.contains(&retried));
    assert!(!loaded.notifications.iter().any(NotificationLog::is_pending));
}

#[test]
fn leftover_pending_entries_fail_visibly() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let mut alert = alert_for("ins-12", Severity::Critical, 2);
    alert.notifications.push(log_for(&alert.id, DeliveryStatus::Pending));
    alert.notifications.push(log_for(&alert.id, DeliveryStatus::Sent));
    store.create_alert(&alert).unwrap();

    let later = t0() + Duration::hours(1);
    assert_eq!(store.fail_pending_notifications("engine stopped", later).unwrap(), 1);
    assert_eq!(store.fail_pending_notifications("engine stopped", later).unwrap(), 0);

    let loaded = store.get_alert(&alert.id).unwrap().unwrap();
    let failed: Vec<_> = loaded.notifications.iter().filter(|n| n.is_failed()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].error.as_deref(), Some("engine stopped"));
    assert_eq!(failed[0].sent_at, later);
}

#[test]
fn pages_walk_the_whole_history_without_gaps() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let mut ids = Vec::new();
    for (i, minutes) in [0, 10, 10, 20, 30].into_iter().enumerate() {
        let mut alert = alert_for(&format!("ins-p{i}"), Severity::Medium, 20);
        alert.created_at = t0() + Duration::minutes(minutes);
        store.create_alert(&alert).unwrap();
        ids.push(alert.id);
    }
    let other = alert_for("ins-low", Severity::Low, 50);
    store.create_alert(&other).unwrap();

    let filter = AlertFilter::new().with_severity(Severity::Medium);
    let mut seen = Vec::new();
    let mut cursor = None;
    let mut pages = 0;
    loop {
        let page = store.list_alerts_page(&filter, cursor.as_ref(), 2).unwrap();
        pages += 1;
        assert!(page.alerts.len() <= 2);
        seen.extend(page.alerts.iter().map(|a| a.id.clone()));
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 5);
    let listed: Vec<_> = store
        .list_alerts(&filter)
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(seen, listed);
    assert_eq!(seen[0], ids[4]);
    assert_eq!(seen[4], ids[0]);
    assert!(!seen.contains(&other.id));
}

#[test]
fn listing_is_not_truncated() {
    let store = SqliteAlertStore::open_in_memory().unwrap();
    let total = vigil_core::constants::MAX_PAGE_SIZE + 5;
    for i in 0..total {
        store
            .create_alert(&alert_for(&format!("ins-h{i}"), Severity::Low, 45))
            .unwrap();
    }

    assert_eq!(store.list_alerts(&AlertFilter::new()).unwrap().len(), total);
    let first = store.list_alerts_page(&AlertFilter::new(), None, usize::MAX).unwrap();
    assert_eq!(first.alerts.len(), vigil_core::constants::MAX_PAGE_SIZE);
    assert!(first.has_more());
}
