//! NotificationDispatcher: bounded, retrying fan-out with delivery logs.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinSet;
use tracing::Instrument;

use vigil_core::config::NotificationConfig;
use vigil_core::errors::{NotificationError, VigilResult};
use vigil_core::models::{
    AlertRule, Channel, ComplianceAlert, DeliveryStatus, NotificationKind, NotificationLog,
    NotificationMessage,
};
use vigil_core::traits::{Clock, IAlertStore, Notifier};

use crate::message;
use crate::retry::RetryPolicy;

/// One notification to fan out over `channels × recipients`.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationJob {
    /// Prefix of the per-pair log ids, so pending entries and their settled
    /// outcome share an id.
    pub id: String,
    pub alert_id: String,
    pub channels: BTreeSet<Channel>,
    pub recipients: Vec<String>,
    pub message: NotificationMessage,
}

impl NotificationJob {
    /// Blank and duplicate recipients are dropped.
    pub fn new(
        alert: &ComplianceAlert,
        kind: NotificationKind,
        channels: BTreeSet<Channel>,
        recipients: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for r in recipients {
            let r = r.trim().to_string();
            if !r.is_empty() && !unique.contains(&r) {
                unique.push(r);
            }
        }
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            alert_id: alert.id.clone(),
            channels,
            recipients: unique,
            message: message::render(alert, kind),
        }
    }

    /// The rule's standard recipients over its channels.
    pub fn standard(alert: &ComplianceAlert, rule: &AlertRule, kind: NotificationKind) -> Self {
        Self::new(
            alert,
            kind,
            rule.notification_settings.channels.clone(),
            rule.notification_settings.recipients.clone(),
        )
    }

    /// Standard recipients plus the escalation list.
    pub fn escalation(alert: &ComplianceAlert, rule: &AlertRule) -> Self {
        Self::new(
            alert,
            NotificationKind::Escalation,
            rule.notification_settings.channels.clone(),
            rule.escalation_recipients(),
        )
    }

    pub fn kind(&self) -> NotificationKind {
        self.message.kind
    }

    /// Number of (recipient, channel) pairs.
    pub fn fan_out(&self) -> usize {
        self.channels.len() * self.recipients.len()
    }

    /// Id of the entry that records the final outcome for one pair.
    pub fn pair_log_id(&self, channel: Channel, recipient: &str) -> String {
        format!("{}:{}:{}", self.id, channel.as_str(), recipient)
    }

    /// One `Pending` entry per pair, to be written together with the state
    /// change that triggered this job. Delivery later settles each in place.
    pub fn pending_logs(&self, at: DateTime<Utc>) -> Vec<NotificationLog> {
        let mut logs = Vec::with_capacity(self.fan_out());
        for &channel in &self.channels {
            for recipient in &self.recipients {
                logs.push(NotificationLog {
                    id: self.pair_log_id(channel, recipient),
                    alert_id: self.alert_id.clone(),
                    kind: self.kind(),
                    channel,
                    recipient: recipient.clone(),
                    sent_at: at,
                    status: DeliveryStatus::Pending,
                    attempts: 0,
                    message: self.message.subject.clone(),
                    error: None,
                });
            }
        }
        logs
    }
}

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight counter even if the task unwinds.
struct InFlightGuard(Arc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.in_flight.idle.notify_waiters();
        }
    }
}

/// One (recipient, channel) pair of a job.
struct Pair {
    log_id: String,
    alert_id: String,
    channel: Channel,
    recipient: String,
}

struct Inner {
    notifiers: HashMap<Channel, Arc<dyn Notifier>>,
    store: Arc<dyn IAlertStore>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    send_timeout: Duration,
    /// Per channel, so a hung transport cannot starve the others. A permit
    /// lives as long as the blocking send holding it, timed out or not.
    permits: HashMap<Channel, Arc<Semaphore>>,
    in_flight: InFlight,
    handle: Handle,
}

/// Cheap to clone; clones share notifiers, permits and in-flight tracking.
#[derive(Clone)]
pub struct NotificationDispatcher {
    inner: Arc<Inner>,
}

impl NotificationDispatcher {
    /// Must be called from within a tokio runtime; `submit` spawns onto it.
    pub fn new(
        config: &NotificationConfig,
        notifiers: Vec<Arc<dyn Notifier>>,
        store: Arc<dyn IAlertStore>,
        clock: Arc<dyn Clock>,
    ) -> VigilResult<Self> {
        let handle = Handle::try_current().map_err(|e| NotificationError::TaskFailed {
            message: format!("no tokio runtime: {e}"),
        })?;
        let notifiers: HashMap<Channel, Arc<dyn Notifier>> =
            notifiers.into_iter().map(|n| (n.channel(), n)).collect();
        let permits = notifiers
            .keys()
            .map(|&c| (c, Arc::new(Semaphore::new(config.max_concurrent_sends.max(1)))))
            .collect();
        Ok(Self {
            inner: Arc::new(Inner {
                notifiers,
                store,
                clock,
                policy: RetryPolicy::from_config(config),
                send_timeout: config.send_timeout(),
                permits,
                in_flight: InFlight::default(),
                handle,
            }),
        })
    }

    /// Deliver `job` and wait for every pair to settle. The caller owns the
    /// returned logs; nothing is persisted here.
    pub async fn dispatch(&self, job: NotificationJob) -> Vec<NotificationLog> {
        Arc::clone(&self.inner).deliver(job).await
    }

    /// Deliver `job` in the background and record the logs on the alert,
    /// settling any pending entries written for it. Returns immediately;
    /// callable from blocking threads.
    pub fn submit(&self, job: NotificationJob) {
        if job.fan_out() == 0 {
            tracing::debug!(alert_id = %job.alert_id, kind = %job.kind(), "nothing to notify");
            return;
        }
        self.inner.in_flight.count.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(Arc::clone(&self.inner));
        let inner = Arc::clone(&self.inner);

        self.inner.handle.spawn(async move {
            let _guard = guard;
            let alert_id = job.alert_id.clone();
            let logs = Arc::clone(&inner).deliver(job).await;

            let store = Arc::clone(&inner.store);
            let persisted =
                tokio::task::spawn_blocking(move || store.append_notifications(&alert_id, &logs))
                    .await;
            match persisted {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "failed to persist notification logs"),
                Err(e) => tracing::error!(error = %e, "notification log task failed"),
            }
        });
    }

    /// Wait until no submitted job is in flight. Returns false on timeout.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let in_flight = &self.inner.in_flight;
        let drained = async {
            loop {
                let idle = in_flight.idle.notified();
                if in_flight.count.load(Ordering::Acquire) == 0 {
                    return;
                }
                idle.await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok()
    }

    /// Submitted jobs not yet persisted.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.count.load(Ordering::Acquire)
    }

    /// Settle every pending entry in the store as failed with `reason`.
    pub async fn fail_pending(&self, reason: &str) -> VigilResult<usize> {
        let store = Arc::clone(&self.inner.store);
        let reason = reason.to_string();
        let at = self.inner.clock.now();
        tokio::task::spawn_blocking(move || store.fail_pending_notifications(&reason, at))
            .await
            .map_err(|e| NotificationError::TaskFailed {
                message: e.to_string(),
            })?
    }
}

impl Inner {
    async fn deliver(self: Arc<Self>, job: NotificationJob) -> Vec<NotificationLog> {
        let span = vigil_core::dispatch_span!(job.alert_id, job.kind());
        async move {
            let mut sends = JoinSet::new();
            for &channel in &job.channels {
                for recipient in &job.recipients {
                    let inner = Arc::clone(&self);
                    let pair = Pair {
                        log_id: job.pair_log_id(channel, recipient),
                        alert_id: job.alert_id.clone(),
                        channel,
                        recipient: recipient.clone(),
                    };
                    let message = job.message.clone();
                    sends.spawn(async move { inner.send_pair(pair, message).await });
                }
            }

            let mut logs = Vec::with_capacity(job.fan_out());
            while let Some(joined) = sends.join_next().await {
                match joined {
                    Ok(pair_logs) => logs.extend(pair_logs),
                    Err(e) => tracing::error!(error = %e, "notification send task aborted"),
                }
            }
            logs.sort_by(|a, b| {
                (a.channel, &a.recipient, a.attempts).cmp(&(b.channel, &b.recipient, b.attempts))
            });
            logs
        }
        .instrument(span)
        .await
    }

    /// Send to one (recipient, channel) pair, retrying transient failures.
    /// Every failed attempt leaves a `Failed` entry; the last entry carries
    /// the pair's log id.
    async fn send_pair(&self, pair: Pair, message: NotificationMessage) -> Vec<NotificationLog> {
        let Pair {
            log_id,
            alert_id,
            channel,
            recipient,
        } = pair;
        let (Some(notifier), Some(permits)) =
            (self.notifiers.get(&channel), self.permits.get(&channel))
        else {
            let err = NotificationError::NoNotifier { channel };
            tracing::warn!(%alert_id, %channel, %recipient, error = %err, "notification delivery failed");
            return vec![self.log(log_id, alert_id, channel, recipient, &message, 0, Err(err))];
        };

        let mut logs = Vec::new();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(notifier, permits, &recipient, &message).await {
                Ok(()) => {
                    logs.push(self.log(log_id, alert_id, channel, recipient, &message, attempt, Ok(())));
                    return logs;
                }
                Err(e) if e.is_transient() && self.policy.should_retry(attempt) => {
                    let backoff = self.policy.backoff_after(attempt);
                    tracing::debug!(
                        %alert_id, %channel, %recipient, attempt, ?backoff, error = %e,
                        "notification send failed, retrying"
                    );
                    let retried = uuid::Uuid::new_v4().to_string();
                    logs.push(self.log(
                        retried,
                        alert_id.clone(),
                        channel,
                        recipient.clone(),
                        &message,
                        attempt,
                        Err(e),
                    ));
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    tracing::warn!(
                        %alert_id, %channel, %recipient, attempt, error = %e,
                        "notification delivery failed"
                    );
                    logs.push(self.log(log_id, alert_id, channel, recipient, &message, attempt, Err(e)));
                    return logs;
                }
            }
        }
    }

    /// One send on the blocking pool. Waiting for a channel permit counts
    /// against the send timeout; the permit moves into the blocking closure
    /// and is released only when the transport call returns.
    async fn attempt(
        &self,
        notifier: &Arc<dyn Notifier>,
        permits: &Arc<Semaphore>,
        recipient: &str,
        message: &NotificationMessage,
    ) -> Result<(), NotificationError> {
        let send = send_holding_permit(
            Arc::clone(notifier),
            Arc::clone(permits),
            recipient.to_string(),
            message.clone(),
        );

        match tokio::time::timeout(self.send_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout {
                timeout_ms: u64::try_from(self.send_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn log(
        &self,
        id: String,
        alert_id: String,
        channel: Channel,
        recipient: String,
        message: &NotificationMessage,
        attempts: u32,
        outcome: Result<(), NotificationError>,
    ) -> NotificationLog {
        let (status, error) = match outcome {
            Ok(()) if channel.is_synchronous() => (DeliveryStatus::Delivered, None),
            Ok(()) => (DeliveryStatus::Sent, None),
            Err(e) => (DeliveryStatus::Failed, Some(e.to_string())),
        };
        NotificationLog {
            id,
            alert_id,
            kind: message.kind,
            channel,
            recipient,
            sent_at: self.clock.now(),
            status,
            attempts,
            message: message.subject.clone(),
            error,
        }
    }
}

/// Wait for a channel permit, then run the send on the blocking pool with the
/// permit moved into it.
async fn send_holding_permit(
    notifier: Arc<dyn Notifier>,
    permits: Arc<Semaphore>,
    recipient: String,
    message: NotificationMessage,
) -> Result<(), NotificationError> {
    let permit = permits
        .acquire_owned()
        .await
        .map_err(|e| NotificationError::TaskFailed {
            message: e.to_string(),
        })?;
    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        notifier.send(&recipient, &message)
    })
    .await
    .map_err(|join| NotificationError::TaskFailed {
        message: join.to_string(),
    })?
}
