//! Span definitions per operation: evaluation, escalation, dispatch, lifecycle.

/// Create an evaluation-cycle span.
#[macro_export]
macro_rules! evaluation_span {
    ($obligation_count:expr) => {
        tracing::info_span!("vigil.evaluation", obligation_count = $obligation_count)
    };
}

/// Create an escalation span.
#[macro_export]
macro_rules! escalation_span {
    ($open_alerts:expr) => {
        tracing::info_span!("vigil.escalation", open_alerts = $open_alerts)
    };
}

/// Create a notification dispatch span.
#[macro_export]
macro_rules! dispatch_span {
    ($alert_id:expr, $kind:expr) => {
        tracing::info_span!("vigil.dispatch", alert_id = %$alert_id, kind = %$kind)
    };
}

/// Create a lifecycle command span.
#[macro_export]
macro_rules! lifecycle_span {
    ($alert_id:expr, $command:expr) => {
        tracing::info_span!("vigil.lifecycle", alert_id = %$alert_id, command = %$command)
    };
}
