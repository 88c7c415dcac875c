//! Periodic evaluation worker.
//!
//! One task ticks on the configured interval and runs each cycle on the
//! blocking pool. Shutdown stops the in-flight cycle between obligations,
//! waits for it, then drains pending notifications for a bounded grace period.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use vigil_core::constants::ABANDONED_AT_SHUTDOWN;
use vigil_core::traits::{Cancellable, CancellationToken};
use vigil_notify::NotificationDispatcher;

use crate::evaluation::EvaluationScheduler;

pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
    dispatcher: NotificationDispatcher,
    grace: Duration,
    cycles: Arc<AtomicU64>,
}

impl WorkerHandle {
    /// Cycles finished so far, including failed and cancelled ones.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Stop the worker and wait for it. Returns once the loop has exited and
    /// pending notifications have drained, or the grace period ran out and
    /// whatever is still pending has been marked failed.
    pub async fn shutdown(self) {
        let Self {
            shutdown_tx,
            cancel,
            join,
            dispatcher,
            grace,
            cycles,
        } = self;
        cancel.cancel();
        let _ = shutdown_tx.send(true);
        if let Err(e) = join.await {
            tracing::error!(error = %e, "evaluation worker task failed");
        }
        if !dispatcher.flush(grace).await {
            tracing::warn!(
                in_flight = dispatcher.in_flight(),
                grace_ms = grace.as_millis() as u64,
                "notifications still in flight at shutdown"
            );
            match dispatcher.fail_pending(ABANDONED_AT_SHUTDOWN).await {
                Ok(abandoned) => tracing::warn!(abandoned, "pending notifications marked failed"),
                Err(e) => tracing::error!(error = %e, "failed to mark pending notifications"),
            }
        }
        tracing::info!(cycles = cycles.load(Ordering::Acquire), "evaluation worker stopped");
    }
}

/// Start the periodic worker. The first cycle runs immediately.
pub fn spawn_worker(
    scheduler: Arc<EvaluationScheduler>,
    dispatcher: NotificationDispatcher,
    interval: Duration,
    grace: Duration,
) -> WorkerHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let cancel = CancellationToken::new();
    let cycles = Arc::new(AtomicU64::new(0));

    let join = {
        let cancel = cancel.clone();
        let cycles = Arc::clone(&cycles);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_secs = interval.as_secs(), "evaluation worker started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }
                if cancel.is_cancelled() {
                    break;
                }

                let scheduler = Arc::clone(&scheduler);
                let token = cancel.clone();
                match tokio::task::spawn_blocking(move || scheduler.run_cycle(&token)).await {
                    Ok(Ok(report)) if report.cancelled => {
                        cycles.fetch_add(1, Ordering::AcqRel);
                        break;
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) if cancel.is_cancelled() => {
                        tracing::debug!(error = %e, "cycle skipped at shutdown");
                        break;
                    }
                    Ok(Err(e)) => tracing::error!(error = %e, "evaluation cycle failed"),
                    Err(e) => tracing::error!(error = %e, "evaluation cycle task panicked"),
                }
                cycles.fetch_add(1, Ordering::AcqRel);
            }
        })
    };

    WorkerHandle {
        shutdown_tx,
        cancel,
        join,
        dispatcher,
        grace,
        cycles,
    }
}
