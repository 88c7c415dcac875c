//! V001: Initial schema.
//! alert_rules, compliance_alerts, alert_actions, notification_logs.

pub const MIGRATION_SQL: &str = r#"
-- One rule per obligation type. Channel and recipient sets are JSON arrays.
CREATE TABLE IF NOT EXISTS alert_rules (
    obligation_type TEXT PRIMARY KEY,
    critical_days INTEGER NOT NULL,
    high_days INTEGER NOT NULL,
    medium_days INTEGER NOT NULL,
    low_days INTEGER NOT NULL,
    channels TEXT NOT NULL,
    recipients TEXT NOT NULL,
    escalate_after_days INTEGER NOT NULL,
    escalate_to TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
) STRICT;

-- Alerts. Timestamps are RFC 3339 text with nanosecond precision so that
-- lexical order matches chronological order.
CREATE TABLE IF NOT EXISTS compliance_alerts (
    id TEXT PRIMARY KEY,
    obligation_id TEXT NOT NULL,
    obligation_type TEXT NOT NULL,
    owner TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    severity TEXT NOT NULL,
    status TEXT NOT NULL,
    expiry_date TEXT NOT NULL,
    days_until_expiry INTEGER NOT NULL,
    assigned_to TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    acknowledged_at TEXT,
    acknowledged_by TEXT,
    resolved_at TEXT,
    resolved_by TEXT,
    dismissed_at TEXT,
    dismissed_by TEXT,
    last_escalated_at TEXT
) STRICT;

-- At most one open alert per obligation.
CREATE UNIQUE INDEX IF NOT EXISTS idx_alerts_open_obligation
    ON compliance_alerts(obligation_id, obligation_type)
    WHERE status IN ('active', 'acknowledged');
CREATE INDEX IF NOT EXISTS idx_alerts_status
    ON compliance_alerts(status, severity);
CREATE INDEX IF NOT EXISTS idx_alerts_created
    ON compliance_alerts(created_at);

-- Remediation tasks, kept in insertion order via position.
CREATE TABLE IF NOT EXISTS alert_actions (
    id TEXT PRIMARY KEY,
    alert_id TEXT NOT NULL REFERENCES compliance_alerts(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    description TEXT NOT NULL,
    assignee TEXT NOT NULL,
    due_date TEXT,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    completed_at TEXT,
    completed_by TEXT
) STRICT;

CREATE INDEX IF NOT EXISTS idx_actions_alert
    ON alert_actions(alert_id, position);

-- Append-only delivery log.
CREATE TABLE IF NOT EXISTS notification_logs (
    id TEXT PRIMARY KEY,
    alert_id TEXT NOT NULL REFERENCES compliance_alerts(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    channel TEXT NOT NULL,
    recipient TEXT NOT NULL,
    sent_at TEXT NOT NULL,
    status TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    message TEXT NOT NULL,
    error TEXT
) STRICT;

CREATE INDEX IF NOT EXISTS idx_notifications_alert
    ON notification_logs(alert_id, sent_at);
"#;
