//! Alert rule persistence: one row per obligation type.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, OptionalExtension, Row};

use vigil_core::errors::VigilResult;
use vigil_core::models::{
    AlertRule, Channel, EscalationPolicy, NotificationSettings, ObligationType,
    SeverityThresholds,
};

use super::{from_json, parse_name, to_json};
use crate::to_storage_err;

const RULE_COLUMNS: &str = "obligation_type, critical_days, high_days, medium_days, low_days, \
     channels, recipients, escalate_after_days, escalate_to, is_active";

struct RuleRow {
    obligation_type: String,
    critical: i64,
    high: i64,
    medium: i64,
    low: i64,
    channels: String,
    recipients: String,
    escalate_after_days: u32,
    escalate_to: String,
    is_active: bool,
}

impl RuleRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            obligation_type: row.get(0)?,
            critical: row.get(1)?,
            high: row.get(2)?,
            medium: row.get(3)?,
            low: row.get(4)?,
            channels: row.get(5)?,
            recipients: row.get(6)?,
            escalate_after_days: row.get(7)?,
            escalate_to: row.get(8)?,
            is_active: row.get(9)?,
        })
    }

    fn into_rule(self) -> VigilResult<AlertRule> {
        let channels: BTreeSet<Channel> = from_json("channels", &self.channels)?;
        Ok(AlertRule {
            obligation_type: parse_name(
                "obligation_type",
                &self.obligation_type,
                ObligationType::parse,
            )?,
            thresholds: SeverityThresholds::new(self.critical, self.high, self.medium, self.low),
            notification_settings: NotificationSettings {
                channels,
                recipients: from_json("recipients", &self.recipients)?,
            },
            escalation: EscalationPolicy {
                escalate_after_days: self.escalate_after_days,
                escalate_to: from_json("escalate_to", &self.escalate_to)?,
            },
            is_active: self.is_active,
        })
    }
}

pub fn list_rules(conn: &Connection) -> VigilResult<Vec<AlertRule>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {RULE_COLUMNS} FROM alert_rules ORDER BY obligation_type"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], RuleRow::read)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.into_iter().map(RuleRow::into_rule).collect()
}

pub fn get_rule(conn: &Connection, obligation_type: ObligationType) -> VigilResult<Option<AlertRule>> {
    let row = conn
        .query_row(
            &format!("SELECT {RULE_COLUMNS} FROM alert_rules WHERE obligation_type = ?1"),
            [obligation_type.as_str()],
            RuleRow::read,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(RuleRow::into_rule).transpose()
}

/// Insert or replace the rule for its obligation type.
pub fn upsert_rule(conn: &Connection, rule: &AlertRule) -> VigilResult<()> {
    write_rule(
        conn,
        rule,
        "ON CONFLICT(obligation_type) DO UPDATE SET
            critical_days = excluded.critical_days,
            high_days = excluded.high_days,
            medium_days = excluded.medium_days,
            low_days = excluded.low_days,
            channels = excluded.channels,
            recipients = excluded.recipients,
            escalate_after_days = excluded.escalate_after_days,
            escalate_to = excluded.escalate_to,
            is_active = excluded.is_active",
    )?;
    Ok(())
}

/// Insert only when the type has no rule. Returns true if a row was written.
pub fn insert_rule_if_absent(conn: &Connection, rule: &AlertRule) -> VigilResult<bool> {
    let changed = write_rule(conn, rule, "ON CONFLICT(obligation_type) DO NOTHING")?;
    Ok(changed == 1)
}

fn write_rule(conn: &Connection, rule: &AlertRule, on_conflict: &str) -> VigilResult<usize> {
    let t = &rule.thresholds;
    conn.execute(
        &format!(
            "INSERT INTO alert_rules ({RULE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             {on_conflict}"
        ),
        params![
            rule.obligation_type.as_str(),
            t.critical,
            t.high,
            t.medium,
            t.low,
            to_json(&rule.notification_settings.channels)?,
            to_json(&rule.notification_settings.recipients)?,
            rule.escalation.escalate_after_days,
            to_json(&rule.escalation.escalate_to)?,
            rule.is_active,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
