//! Property tests for vigil-core models: tier selection and the lifecycle
//! state machine.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use vigil_core::models::{
    AlertStatus, ComplianceAlert, LifecycleCommand, MonitoredObligation, ObligationType, Severity,
    SeverityThresholds,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
}

fn thresholds_strategy() -> impl Strategy<Value = SeverityThresholds> {
    (0i64..30, 0i64..30, 0i64..30, 0i64..60).prop_map(|(c, dh, dm, dl)| {
        SeverityThresholds::new(c, c + dh, c + dh + dm, c + dh + dm + dl)
    })
}

fn command_strategy() -> impl Strategy<Value = LifecycleCommand> {
    prop_oneof![
        Just(LifecycleCommand::Acknowledge),
        Just(LifecycleCommand::Resolve),
        Just(LifecycleCommand::Dismiss),
    ]
}

fn fresh_alert() -> ComplianceAlert {
    let ob = MonitoredObligation::new(
        "cert-1",
        ObligationType::SiteCertification,
        "Site B fire certificate",
        t0() + Duration::days(10),
        "site-b",
    );
    ComplianceAlert::open(&ob, t0() + Duration::days(10), Severity::High, 10, BTreeSet::new(), t0())
}

proptest! {
    #[test]
    fn generated_thresholds_validate(t in thresholds_strategy()) {
        prop_assert!(t.validate().is_ok());
    }

    #[test]
    fn overdue_is_always_critical(t in thresholds_strategy(), overdue in 1i64..1000) {
        prop_assert_eq!(t.tier_for(-overdue), Some(Severity::Critical));
    }

    #[test]
    fn tier_never_loosens_as_expiry_nears(t in thresholds_strategy(), days in -10i64..200) {
        let later = t.tier_for(days + 1);
        let sooner = t.tier_for(days);
        match (sooner, later) {
            (Some(s), Some(l)) => prop_assert!(s >= l),
            (None, Some(_)) => prop_assert!(false, "tier appeared further from expiry"),
            _ => {}
        }
    }

    #[test]
    fn tier_bound_is_respected(t in thresholds_strategy(), days in -10i64..200) {
        let clear = SeverityThresholds::clear_days(days);
        if let Some(sev) = t.tier_for(days) {
            prop_assert!(clear <= t.bound(sev));
        } else {
            prop_assert!(clear > t.low);
        }
    }

    #[test]
    fn terminal_states_absorb_every_command(
        commands in prop::collection::vec(command_strategy(), 1..12)
    ) {
        let mut alert = fresh_alert();
        let mut now = t0();
        let mut terminal_seen: Option<AlertStatus> = None;
        for cmd in commands {
            now += Duration::hours(1);
            let before = alert.clone();
            let result = alert.apply(cmd, "officer", now);
            if let Some(status) = terminal_seen {
                prop_assert!(result.is_err());
                prop_assert_eq!(&alert, &before);
                prop_assert_eq!(alert.status, status);
            } else if alert.status.is_terminal() {
                terminal_seen = Some(alert.status);
            }
        }
    }

    #[test]
    fn audit_fields_match_status(
        commands in prop::collection::vec(command_strategy(), 1..8)
    ) {
        let mut alert = fresh_alert();
        for cmd in commands {
            let _ = alert.apply(cmd, "officer", t0() + Duration::hours(2));
        }
        prop_assert_eq!(alert.resolved_at.is_some(), alert.status == AlertStatus::Resolved);
        prop_assert_eq!(alert.dismissed_at.is_some(), alert.status == AlertStatus::Dismissed);
        prop_assert_eq!(alert.resolved_by.is_some(), alert.resolved_at.is_some());
        prop_assert_eq!(alert.acknowledged_by.is_some(), alert.acknowledged_at.is_some());
    }
}
