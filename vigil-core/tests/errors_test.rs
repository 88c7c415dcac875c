//! Error code mapping and display tests.

use vigil_core::errors::error_code;
use vigil_core::errors::{
    ConfigError, EvaluationError, LifecycleError, NotificationError, StorageError, VigilError,
    VigilErrorCode,
};
use vigil_core::models::{AlertStatus, Channel, LifecycleCommand, ObligationType};

#[test]
fn every_subsystem_maps_to_its_code() {
    let cases: Vec<(VigilError, &str)> = vec![
        (
            ConfigError::MissingRule {
                obligation_type: ObligationType::Insurance,
            }
            .into(),
            error_code::MISSING_RULE,
        ),
        (
            StorageError::DuplicateOpenAlert {
                obligation_id: "ins-1".into(),
                obligation_type: "insurance".into(),
            }
            .into(),
            error_code::DUPLICATE_OPEN_ALERT,
        ),
        (
            EvaluationError::MissingExpiry {
                obligation_id: "ins-1".into(),
            }
            .into(),
            error_code::EVALUATION_ERROR,
        ),
        (EvaluationError::Cancelled.into(), error_code::CANCELLED),
        (
            LifecycleError::AlreadyTerminal {
                alert_id: "a".into(),
                status: AlertStatus::Resolved,
                command: LifecycleCommand::Acknowledge,
            }
            .into(),
            error_code::ALREADY_TERMINAL,
        ),
        (
            LifecycleError::MissingActor {
                command: LifecycleCommand::Resolve,
            }
            .into(),
            error_code::MISSING_ACTOR,
        ),
        (
            NotificationError::Timeout { timeout_ms: 10 }.into(),
            error_code::NOTIFICATION_FAILURE,
        ),
        (VigilError::alert_not_found("a"), error_code::NOT_FOUND),
    ];

    for (err, code) in cases {
        assert_eq!(err.error_code(), code, "{err}");
    }
}

#[test]
fn missing_action_counts_as_not_found() {
    let err: VigilError = LifecycleError::ActionNotFound {
        alert_id: "a".into(),
        action_id: "x".into(),
    }
    .into();
    assert!(err.is_not_found());
    assert!(!err.is_already_terminal());
}

#[test]
fn transient_classification() {
    let transport = NotificationError::Transport {
        channel: Channel::Email,
        recipient: "ops".into(),
        message: "connection reset".into(),
    };
    let rejected = NotificationError::Rejected {
        channel: Channel::Sms,
        recipient: "ops".into(),
        message: "unsubscribed".into(),
    };
    assert!(transport.is_transient());
    assert!(NotificationError::Timeout { timeout_ms: 5 }.is_transient());
    assert!(!rejected.is_transient());
    assert!(!NotificationError::NoNotifier {
        channel: Channel::Sms
    }
    .is_transient());
}

#[test]
fn display_names_the_command_and_state() {
    let err = LifecycleError::InvalidTransition {
        alert_id: "alert-9".into(),
        from: AlertStatus::Acknowledged,
        command: LifecycleCommand::Acknowledge,
    };
    let text = err.to_string();
    assert!(text.contains("acknowledge"));
    assert!(text.contains("alert-9"));
    assert!(text.contains("acknowledged"));
}
