//! Dispatcher behavior: fan-out, retry, timeout, background persistence.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};

use vigil_core::config::NotificationConfig;
use vigil_core::models::{
    Channel, ComplianceAlert, DeliveryStatus, MonitoredObligation, NotificationKind,
    ObligationType, Severity,
};
use vigil_core::traits::{IAlertStore, ManualClock, Notifier};
use vigil_notify::{NotificationDispatcher, NotificationJob, RecordingNotifier};
use vigil_storage::SqliteAlertStore;

struct Harness {
    store: Arc<SqliteAlertStore>,
    email: Arc<RecordingNotifier>,
    in_app: Arc<RecordingNotifier>,
    dispatcher: NotificationDispatcher,
    alert: ComplianceAlert,
}

fn fast_config() -> NotificationConfig {
    NotificationConfig {
        max_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 4,
        send_timeout_ms: 1_000,
        ..NotificationConfig::default()
    }
}

fn harness(config: NotificationConfig) -> Harness {
    let now = Utc.with_ymd_and_hms(2026, 7, 1, 8, 0, 0).unwrap();
    let store = Arc::new(SqliteAlertStore::open_in_memory().unwrap());
    let ob = MonitoredObligation::new(
        "wc-1",
        ObligationType::ContractRenewal,
        "Cleaning services contract",
        now + ChronoDuration::days(20),
        "vendor-3",
    );
    let alert = ComplianceAlert::open(&ob, now + ChronoDuration::days(20), Severity::Medium, 20, BTreeSet::new(), now);
    store.create_alert(&alert).unwrap();

    let email = Arc::new(RecordingNotifier::new(Channel::Email));
    let in_app = Arc::new(RecordingNotifier::new(Channel::InApp));
    let notifiers: Vec<Arc<dyn Notifier>> = vec![email.clone(), in_app.clone()];
    let dispatcher = NotificationDispatcher::new(
        &config,
        notifiers,
        store.clone(),
        Arc::new(ManualClock::new(now)),
    )
    .unwrap();

    Harness {
        store,
        email,
        in_app,
        dispatcher,
        alert,
    }
}

fn job(h: &Harness, channels: &[Channel], recipients: &[&str]) -> NotificationJob {
    NotificationJob::new(
        &h.alert,
        NotificationKind::Initial,
        channels.iter().copied().collect(),
        recipients.iter().map(|r| r.to_string()),
    )
}

#[tokio::test]
async fn fans_out_to_every_pair() {
    let h = harness(fast_config());
    let logs = h
        .dispatcher
        .dispatch(job(&h, &[Channel::Email, Channel::InApp], &["officer", "manager", "officer", " "]))
        .await;

    assert_eq!(logs.len(), 4);
    for log in &logs {
        assert_eq!(log.attempts, 1);
        assert_eq!(log.kind, NotificationKind::Initial);
        let expected = if log.channel == Channel::InApp {
            DeliveryStatus::Delivered
        } else {
            DeliveryStatus::Sent
        };
        assert_eq!(log.status, expected);
    }
    assert_eq!(h.email.sent().len(), 2);
    assert_eq!(h.in_app.sent().len(), 2);
}

#[tokio::test]
async fn each_failed_attempt_is_logged_before_the_retry() {
    let h = harness(fast_config());
    h.email.fail_next(2);
    let j = job(&h, &[Channel::Email], &["officer"]);
    let final_id = j.pair_log_id(Channel::Email, "officer");
    let logs = h.dispatcher.dispatch(j).await;

    let trail: Vec<_> = logs.iter().map(|l| (l.status, l.attempts)).collect();
    assert_eq!(
        trail,
        vec![
            (DeliveryStatus::Failed, 1),
            (DeliveryStatus::Failed, 2),
            (DeliveryStatus::Sent, 3)
        ]
    );
    assert!(logs[0].error.as_deref().unwrap_or_default().contains("connection reset"));
    assert_eq!(logs[2].id, final_id);
    assert_ne!(logs[0].id, logs[1].id);
    assert_eq!(h.email.attempts(), 3);
}

#[tokio::test]
async fn exhausted_retries_leave_a_failed_entry() {
    let h = harness(fast_config());
    h.email.fail_next(10);
    let logs = h.dispatcher.dispatch(job(&h, &[Channel::Email], &["officer"])).await;

    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|l| l.is_failed()));
    let last = &logs[2];
    assert_eq!(last.attempts, 3);
    assert!(last.error.as_deref().unwrap_or_default().contains("connection reset"));
}

#[tokio::test]
async fn permanent_rejection_is_not_retried() {
    let h = harness(fast_config());
    h.email.reject("ghost");
    let logs = h.dispatcher.dispatch(job(&h, &[Channel::Email], &["ghost"])).await;

    assert!(logs[0].is_failed());
    assert_eq!(logs[0].attempts, 1);
}

#[tokio::test]
async fn channel_without_notifier_fails_visibly() {
    let h = harness(fast_config());
    let logs = h.dispatcher.dispatch(job(&h, &[Channel::Sms], &["officer"])).await;

    assert_eq!(logs.len(), 1);
    assert!(logs[0].is_failed());
    assert_eq!(logs[0].attempts, 0);
}

#[tokio::test]
async fn stalled_send_times_out_as_transient() {
    let h = harness(NotificationConfig {
        max_attempts: 2,
        initial_backoff_ms: 1,
        max_backoff_ms: 1,
        send_timeout_ms: 20,
        ..NotificationConfig::default()
    });
    h.email.stall_for(Duration::from_millis(200));
    let logs = h.dispatcher.dispatch(job(&h, &[Channel::Email], &["officer"])).await;

    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1].attempts, 2);
    for log in &logs {
        assert!(log.is_failed());
        assert!(log.error.as_deref().unwrap_or_default().contains("timed out"));
    }
}

#[tokio::test]
async fn hung_channel_does_not_starve_a_healthy_one() {
    let h = harness(NotificationConfig {
        max_attempts: 2,
        initial_backoff_ms: 1,
        max_backoff_ms: 1,
        send_timeout_ms: 30,
        max_concurrent_sends: 2,
        ..NotificationConfig::default()
    });
    h.email.stall_for(Duration::from_millis(600));
    let recipients = ["r1", "r2", "r3", "r4", "r5"];
    let logs = h
        .dispatcher
        .dispatch(job(&h, &[Channel::Email, Channel::InApp], &recipients))
        .await;

    // Hung sends keep their permits, so later email attempts wait instead of
    // piling more threads onto the blocking pool.
    assert!(h.email.attempts() <= 2, "email sends started: {}", h.email.attempts());
    let email: Vec<_> = logs.iter().filter(|l| l.channel == Channel::Email).collect();
    assert_eq!(email.len(), 10);
    assert!(email.iter().all(|l| l.is_failed()));

    let in_app: Vec<_> = logs.iter().filter(|l| l.channel == Channel::InApp).collect();
    assert_eq!(in_app.len(), 5);
    assert!(in_app.iter().all(|l| l.status == DeliveryStatus::Delivered));
    assert_eq!(h.in_app.sent().len(), 5);
}

#[tokio::test]
async fn pending_entries_settle_in_place() {
    let h = harness(fast_config());
    h.email.fail_next(1);
    let j = job(&h, &[Channel::Email, Channel::InApp], &["officer"]);
    let pending = j.pending_logs(h.alert.created_at);
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|l| l.is_pending() && l.attempts == 0));
    h.store.append_notifications(&h.alert.id, &pending).unwrap();

    h.dispatcher.submit(j);
    assert!(h.dispatcher.flush(Duration::from_secs(5)).await);

    let stored = h.store.get_alert(&h.alert.id).unwrap().unwrap();
    assert_eq!(stored.notifications.len(), 3);
    assert!(!stored.notifications.iter().any(|l| l.is_pending()));
    for entry in &pending {
        let settled = stored.notifications.iter().find(|l| l.id == entry.id).unwrap();
        let expected = match entry.channel {
            Channel::InApp => (DeliveryStatus::Delivered, 1),
            _ => (DeliveryStatus::Sent, 2),
        };
        assert_eq!((settled.status, settled.attempts), expected);
    }
}

#[tokio::test]
async fn fail_pending_settles_leftovers() {
    let h = harness(fast_config());
    let j = job(&h, &[Channel::Email], &["officer"]);
    h.store
        .append_notifications(&h.alert.id, &j.pending_logs(h.alert.created_at))
        .unwrap();

    assert_eq!(h.dispatcher.fail_pending("abandoned").await.unwrap(), 1);
    let stored = h.store.get_alert(&h.alert.id).unwrap().unwrap();
    assert!(stored.notifications[0].is_failed());
    assert_eq!(stored.notifications[0].error.as_deref(), Some("abandoned"));
}

#[tokio::test]
async fn submitted_logs_are_persisted_on_the_alert() {
    let h = harness(fast_config());
    h.dispatcher
        .submit(job(&h, &[Channel::Email, Channel::InApp], &["officer"]));
    assert!(h.dispatcher.flush(Duration::from_secs(5)).await);
    assert_eq!(h.dispatcher.in_flight(), 0);

    let stored = h.store.get_alert(&h.alert.id).unwrap().unwrap();
    assert_eq!(stored.notifications.len(), 2);
}

#[tokio::test]
async fn slow_channel_does_not_block_submit() {
    let h = harness(NotificationConfig {
        send_timeout_ms: 2_000,
        ..fast_config()
    });
    h.email.stall_for(Duration::from_millis(150));

    h.dispatcher.submit(job(&h, &[Channel::Email], &["officer"]));
    assert_eq!(h.dispatcher.in_flight(), 1);
    assert!(!h.dispatcher.flush(Duration::from_millis(10)).await);
    assert!(h.dispatcher.flush(Duration::from_secs(5)).await);

    let stored = h.store.get_alert(&h.alert.id).unwrap().unwrap();
    assert_eq!(stored.notifications.len(), 1);
    assert_eq!(stored.notifications[0].status, DeliveryStatus::Sent);
}
