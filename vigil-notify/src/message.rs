//! Rendering of notification subject and body per kind.

use vigil_core::models::{ComplianceAlert, NotificationKind, NotificationMessage};

pub fn render(alert: &ComplianceAlert, kind: NotificationKind) -> NotificationMessage {
    let severity = alert.severity.as_str().to_uppercase();
    let subject = match kind {
        NotificationKind::Initial => format!("[{severity}] {}", alert.title),
        NotificationKind::SeverityIncrease => {
            format!("[{severity}] Severity raised: {}", alert.title)
        }
        NotificationKind::Escalation => format!("[ESCALATED] {}", alert.title),
        NotificationKind::Reminder => format!("Reminder: {}", alert.title),
    };

    let mut body = format!(
        "{}\n\nSeverity: {}\nStatus: {}\nExpiry: {}",
        alert.description,
        alert.severity,
        alert.status,
        alert.expiry_date.format("%Y-%m-%d"),
    );
    let open_actions = alert
        .actions
        .iter()
        .filter(|a| a.completed_at.is_none())
        .count();
    if open_actions > 0 {
        body.push_str(&format!("\nOpen actions: {open_actions}"));
    }
    if kind == NotificationKind::Escalation {
        body.push_str(&format!(
            "\n\nThis alert has had no response since {}.",
            alert.state_epoch_start().format("%Y-%m-%d")
        ));
    }

    NotificationMessage {
        kind,
        subject,
        body,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, TimeZone, Utc};
    use vigil_core::models::{MonitoredObligation, ObligationType, Severity};

    use super::*;

    fn alert() -> ComplianceAlert {
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
        let ob = MonitoredObligation::new(
            "mou-4",
            ObligationType::MouExpiry,
            "Northside Clinic MoU",
            now + Duration::days(5),
            "partner-4",
        );
        ComplianceAlert::open(&ob, now + Duration::days(5), Severity::Critical, 5, BTreeSet::new(), now)
    }

    #[test]
    fn subject_reflects_kind() {
        let a = alert();
        assert!(render(&a, NotificationKind::Initial).subject.starts_with("[CRITICAL]"));
        assert!(render(&a, NotificationKind::Escalation).subject.starts_with("[ESCALATED]"));
        assert!(render(&a, NotificationKind::Reminder).subject.starts_with("Reminder:"));
        assert!(render(&a, NotificationKind::SeverityIncrease)
            .subject
            .contains("Severity raised"));
    }

    #[test]
    fn body_carries_expiry() {
        let msg = render(&alert(), NotificationKind::Initial);
        assert!(msg.body.contains("2026-02-15"));
        assert_eq!(msg.kind, NotificationKind::Initial);
    }
}
