//! Compliance alert rows. Child actions and notification logs are loaded
//! alongside so callers always see a complete `ComplianceAlert`.

use std::collections::BTreeSet;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use vigil_core::errors::{StorageError, VigilError, VigilResult};
use vigil_core::models::{
    page_size, AlertCursor, AlertFilter, AlertPage, AlertStatus, ComplianceAlert,
    ObligationType, Severity,
};

use super::{actions, notifications};
use super::{from_json, opt_ts, parse_name, parse_opt_ts, parse_ts, to_json, ts};
use crate::to_storage_err;

const ALERT_COLUMNS: &str = "id, obligation_id, obligation_type, owner, title, description, \
     severity, status, expiry_date, days_until_expiry, assigned_to, created_at, updated_at, \
     acknowledged_at, acknowledged_by, resolved_at, resolved_by, dismissed_at, dismissed_by, \
     last_escalated_at";

const OPEN_STATUSES: &str = "('active', 'acknowledged')";

struct AlertRow {
    id: String,
    obligation_id: String,
    obligation_type: String,
    owner: String,
    title: String,
    description: String,
    severity: String,
    status: String,
    expiry_date: String,
    days_until_expiry: i64,
    assigned_to: String,
    created_at: String,
    updated_at: String,
    acknowledged_at: Option<String>,
    acknowledged_by: Option<String>,
    resolved_at: Option<String>,
    resolved_by: Option<String>,
    dismissed_at: Option<String>,
    dismissed_by: Option<String>,
    last_escalated_at: Option<String>,
}

impl AlertRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            obligation_id: row.get(1)?,
            obligation_type: row.get(2)?,
            owner: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            severity: row.get(6)?,
            status: row.get(7)?,
            expiry_date: row.get(8)?,
            days_until_expiry: row.get(9)?,
            assigned_to: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
            acknowledged_at: row.get(13)?,
            acknowledged_by: row.get(14)?,
            resolved_at: row.get(15)?,
            resolved_by: row.get(16)?,
            dismissed_at: row.get(17)?,
            dismissed_by: row.get(18)?,
            last_escalated_at: row.get(19)?,
        })
    }

    /// Decode the row and attach its actions and notification log.
    fn hydrate(self, conn: &Connection) -> VigilResult<ComplianceAlert> {
        let assigned_to: BTreeSet<String> = from_json("assigned_to", &self.assigned_to)?;
        let actions = actions::list_actions(conn, &self.id)?;
        let notifications = notifications::list_notifications(conn, &self.id)?;
        Ok(ComplianceAlert {
            obligation_type: parse_name(
                "obligation_type",
                &self.obligation_type,
                ObligationType::parse,
            )?,
            severity: parse_name("severity", &self.severity, Severity::parse)?,
            status: parse_name("status", &self.status, AlertStatus::parse)?,
            expiry_date: parse_ts("expiry_date", &self.expiry_date)?,
            created_at: parse_ts("created_at", &self.created_at)?,
            updated_at: parse_ts("updated_at", &self.updated_at)?,
            acknowledged_at: parse_opt_ts("acknowledged_at", self.acknowledged_at)?,
            resolved_at: parse_opt_ts("resolved_at", self.resolved_at)?,
            dismissed_at: parse_opt_ts("dismissed_at", self.dismissed_at)?,
            last_escalated_at: parse_opt_ts("last_escalated_at", self.last_escalated_at)?,
            id: self.id,
            obligation_id: self.obligation_id,
            owner: self.owner,
            title: self.title,
            description: self.description,
            days_until_expiry: self.days_until_expiry,
            assigned_to,
            acknowledged_by: self.acknowledged_by,
            resolved_by: self.resolved_by,
            dismissed_by: self.dismissed_by,
            actions,
            notifications,
        })
    }
}

/// Insert a new alert with its children. A second open alert for the same
/// obligation trips the partial unique index and becomes `DuplicateOpenAlert`.
pub fn insert_alert(conn: &Connection, alert: &ComplianceAlert) -> VigilResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO compliance_alerts ({ALERT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
        ),
        params![
            alert.id,
            alert.obligation_id,
            alert.obligation_type.as_str(),
            alert.owner,
            alert.title,
            alert.description,
            alert.severity.as_str(),
            alert.status.as_str(),
            ts(&alert.expiry_date),
            alert.days_until_expiry,
            to_json(&alert.assigned_to)?,
            ts(&alert.created_at),
            ts(&alert.updated_at),
            opt_ts(alert.acknowledged_at.as_ref()),
            alert.acknowledged_by,
            opt_ts(alert.resolved_at.as_ref()),
            alert.resolved_by,
            opt_ts(alert.dismissed_at.as_ref()),
            alert.dismissed_by,
            opt_ts(alert.last_escalated_at.as_ref()),
        ],
    )
    .map_err(|e| insert_err(alert, e))?;

    actions::upsert_actions(conn, &alert.id, &alert.actions)?;
    notifications::insert_notifications(conn, &alert.id, &alert.notifications)?;
    Ok(())
}

fn insert_err(alert: &ComplianceAlert, e: rusqlite::Error) -> VigilError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StorageError::DuplicateOpenAlert {
                obligation_id: alert.obligation_id.clone(),
                obligation_type: alert.obligation_type.as_str().to_string(),
            }
            .into()
        }
        other => to_storage_err(other.to_string()),
    }
}

/// Write the mutable columns of an existing alert, then sync its children.
/// Title, description and creation fields never change after insert.
pub fn update_alert(conn: &Connection, alert: &ComplianceAlert) -> VigilResult<()> {
    let changed = conn
        .execute(
            "UPDATE compliance_alerts SET
                severity = ?2,
                status = ?3,
                expiry_date = ?4,
                days_until_expiry = ?5,
                assigned_to = ?6,
                updated_at = ?7,
                acknowledged_at = ?8,
                acknowledged_by = ?9,
                resolved_at = ?10,
                resolved_by = ?11,
                dismissed_at = ?12,
                dismissed_by = ?13,
                last_escalated_at = ?14
             WHERE id = ?1",
            params![
                alert.id,
                alert.severity.as_str(),
                alert.status.as_str(),
                ts(&alert.expiry_date),
                alert.days_until_expiry,
                to_json(&alert.assigned_to)?,
                ts(&alert.updated_at),
                opt_ts(alert.acknowledged_at.as_ref()),
                alert.acknowledged_by,
                opt_ts(alert.resolved_at.as_ref()),
                alert.resolved_by,
                opt_ts(alert.dismissed_at.as_ref()),
                alert.dismissed_by,
                opt_ts(alert.last_escalated_at.as_ref()),
            ],
        )
        .map_err(|e| insert_err(alert, e))?;
    if changed == 0 {
        return Err(VigilError::alert_not_found(&alert.id));
    }

    actions::upsert_actions(conn, &alert.id, &alert.actions)?;
    notifications::insert_notifications(conn, &alert.id, &alert.notifications)?;
    Ok(())
}

pub fn alert_exists(conn: &Connection, id: &str) -> VigilResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM compliance_alerts WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn get_alert(conn: &Connection, id: &str) -> VigilResult<Option<ComplianceAlert>> {
    let row = conn
        .query_row(
            &format!("SELECT {ALERT_COLUMNS} FROM compliance_alerts WHERE id = ?1"),
            [id],
            AlertRow::read,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(|r| r.hydrate(conn)).transpose()
}

pub fn find_open_alert(
    conn: &Connection,
    obligation_id: &str,
    obligation_type: ObligationType,
) -> VigilResult<Option<ComplianceAlert>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {ALERT_COLUMNS} FROM compliance_alerts
                 WHERE obligation_id = ?1 AND obligation_type = ?2 AND status IN {OPEN_STATUSES}"
            ),
            params![obligation_id, obligation_type.as_str()],
            AlertRow::read,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(|r| r.hydrate(conn)).transpose()
}

/// WHERE fragments and their positional values for `filter`.
fn filter_clauses(filter: &AlertFilter) -> (Vec<String>, Vec<String>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();
    let mut push = |column: &str, value: String| {
        values.push(value);
        clauses.push(format!("{column} = ?{}", values.len()));
    };
    if let Some(severity) = filter.severity {
        push("severity", severity.as_str().to_string());
    }
    if let Some(status) = filter.status {
        push("status", status.as_str().to_string());
    }
    if let Some(obligation_type) = filter.obligation_type {
        push("obligation_type", obligation_type.as_str().to_string());
    }
    if let Some(obligation_id) = &filter.obligation_id {
        push("obligation_id", obligation_id.clone());
    }
    (clauses, values)
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}

/// Every alert matching `filter`, newest first.
pub fn list_alerts(conn: &Connection, filter: &AlertFilter) -> VigilResult<Vec<ComplianceAlert>> {
    let (clauses, values) = filter_clauses(filter);
    select_alerts(
        conn,
        &format!(
            "SELECT {ALERT_COLUMNS} FROM compliance_alerts {}
             ORDER BY created_at DESC, id",
            where_sql(&clauses)
        ),
        &values,
    )
}

/// Keyset page over the newest-first listing. Fetches one extra row to learn
/// whether another page exists.
pub fn list_alerts_page(
    conn: &Connection,
    filter: &AlertFilter,
    after: Option<&AlertCursor>,
    limit: usize,
) -> VigilResult<AlertPage> {
    let limit = page_size(limit);
    let (mut clauses, mut values) = filter_clauses(filter);
    if let Some(cursor) = after {
        values.push(ts(&cursor.created_at));
        let at = values.len();
        values.push(cursor.id.clone());
        let id = values.len();
        clauses.push(format!(
            "(created_at < ?{at} OR (created_at = ?{at} AND id > ?{id}))"
        ));
    }
    let mut alerts = select_alerts(
        conn,
        &format!(
            "SELECT {ALERT_COLUMNS} FROM compliance_alerts {}
             ORDER BY created_at DESC, id LIMIT {}",
            where_sql(&clauses),
            limit + 1
        ),
        &values,
    )?;
    let next = if alerts.len() > limit {
        alerts.truncate(limit);
        alerts.last().map(AlertCursor::after)
    } else {
        None
    };
    Ok(AlertPage { alerts, next })
}

/// Open alerts, oldest first.
pub fn list_open_alerts(conn: &Connection) -> VigilResult<Vec<ComplianceAlert>> {
    select_alerts(
        conn,
        &format!(
            "SELECT {ALERT_COLUMNS} FROM compliance_alerts
             WHERE status IN {OPEN_STATUSES} ORDER BY created_at, id"
        ),
        &[],
    )
}

fn select_alerts(conn: &Connection, sql: &str, values: &[String]) -> VigilResult<Vec<ComplianceAlert>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), AlertRow::read)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.into_iter().map(|r| r.hydrate(conn)).collect()
}

pub fn count_by_status(conn: &Connection) -> VigilResult<Vec<(AlertStatus, usize)>> {
    group_count(
        conn,
        "SELECT status, COUNT(*) FROM compliance_alerts GROUP BY status",
        "status",
        AlertStatus::parse,
    )
}

pub fn count_open_by_severity(conn: &Connection) -> VigilResult<Vec<(Severity, usize)>> {
    group_count(
        conn,
        &format!(
            "SELECT severity, COUNT(*) FROM compliance_alerts
             WHERE status IN {OPEN_STATUSES} GROUP BY severity"
        ),
        "severity",
        Severity::parse,
    )
}

fn group_count<T>(
    conn: &Connection,
    sql: &str,
    column: &str,
    parse: fn(&str) -> Option<T>,
) -> VigilResult<Vec<(T, usize)>> {
    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.into_iter()
        .map(|(name, n)| Ok((parse_name(column, &name, parse)?, n as usize)))
        .collect()
}
