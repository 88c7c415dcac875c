//! Property tests for severity classification.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use vigil_core::models::{MonitoredObligation, ObligationType, Severity, SeverityThresholds};
use vigil_engine::{days_until_expiry, Classification, RuleCatalog, SeverityClassifier};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 14, 23, 15, 0).unwrap()
}

fn thresholds_strategy() -> impl Strategy<Value = SeverityThresholds> {
    (0i64..20, 0i64..20, 0i64..40, 0i64..60).prop_map(|(c, dh, dm, dl)| {
        SeverityThresholds::new(c, c + dh, c + dh + dm, c + dh + dm + dl)
    })
}

fn obligation(expiry: DateTime<Utc>) -> MonitoredObligation {
    MonitoredObligation::new(
        "ins-9",
        ObligationType::Insurance,
        "Professional indemnity",
        expiry,
        "contractor-9",
    )
}

fn rule(thresholds: SeverityThresholds) -> vigil_core::models::AlertRule {
    let mut rule = RuleCatalog::default_rule(ObligationType::Insurance);
    rule.thresholds = thresholds;
    rule
}

proptest! {
    #[test]
    fn days_are_floored(days in -400i64..400, secs in 0i64..86_400) {
        let expiry = now() + Duration::days(days) + Duration::seconds(secs);
        prop_assert_eq!(days_until_expiry(expiry, now()), days);
    }

    #[test]
    fn severity_never_drops_as_time_passes(
        t in thresholds_strategy(),
        days in -30i64..200,
        elapsed in 0i64..200,
    ) {
        let ob = obligation(now() + Duration::days(days));
        let r = rule(t);
        let earlier = SeverityClassifier::classify(&ob, &r, now()).unwrap();
        let later = SeverityClassifier::classify(&ob, &r, now() + Duration::days(elapsed)).unwrap();
        if let Some(before) = earlier {
            prop_assert!(later.is_some_and(|after| after >= before));
        }
    }

    #[test]
    fn overdue_floor_holds(t in thresholds_strategy(), overdue in 1i64..500) {
        let ob = obligation(now() - Duration::days(overdue));
        prop_assert_eq!(
            SeverityClassifier::classify(&ob, &rule(t), now()).unwrap(),
            Some(Severity::Critical)
        );
    }

    #[test]
    fn not_due_exactly_beyond_low(t in thresholds_strategy(), days in 0i64..300) {
        let ob = obligation(now() + Duration::days(days));
        let class = SeverityClassifier::assess(&ob, &rule(t), now()).unwrap();
        prop_assert_eq!(matches!(class, Classification::NotDue { .. }), days > t.low + 1);
    }

    #[test]
    fn inactive_rule_never_classifies(t in thresholds_strategy(), days in -100i64..300) {
        let ob = obligation(now() + Duration::days(days));
        let mut r = rule(t);
        r.is_active = false;
        prop_assert_eq!(
            SeverityClassifier::assess(&ob, &r, now()).unwrap(),
            Classification::RuleInactive
        );
    }
}
