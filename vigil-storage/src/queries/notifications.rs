//! Notification log. Entries are appended; pending entries settle in place.

use rusqlite::{params, Connection, Row};

use vigil_core::errors::VigilResult;
use vigil_core::models::{Channel, DeliveryStatus, NotificationKind, NotificationLog};

use chrono::{DateTime, Utc};

use super::{parse_name, parse_ts, ts};
use crate::to_storage_err;

struct LogRow {
    id: String,
    alert_id: String,
    kind: String,
    channel: String,
    recipient: String,
    sent_at: String,
    status: String,
    attempts: u32,
    message: String,
    error: Option<String>,
}

impl LogRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            alert_id: row.get(1)?,
            kind: row.get(2)?,
            channel: row.get(3)?,
            recipient: row.get(4)?,
            sent_at: row.get(5)?,
            status: row.get(6)?,
            attempts: row.get(7)?,
            message: row.get(8)?,
            error: row.get(9)?,
        })
    }

    fn into_log(self) -> VigilResult<NotificationLog> {
        Ok(NotificationLog {
            id: self.id,
            alert_id: self.alert_id,
            kind: parse_name("kind", &self.kind, NotificationKind::parse)?,
            channel: parse_name("channel", &self.channel, Channel::parse)?,
            recipient: self.recipient,
            sent_at: parse_ts("sent_at", &self.sent_at)?,
            status: parse_name("status", &self.status, DeliveryStatus::parse)?,
            attempts: self.attempts,
            message: self.message,
            error: self.error,
        })
    }
}

pub fn list_notifications(conn: &Connection, alert_id: &str) -> VigilResult<Vec<NotificationLog>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, alert_id, kind, channel, recipient, sent_at, status, attempts, message, error
             FROM notification_logs WHERE alert_id = ?1 ORDER BY sent_at, rowid",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([alert_id], LogRow::read)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.into_iter().map(LogRow::into_log).collect()
}

/// Insert log entries. Entries already present (same id) are left untouched.
pub fn insert_notifications(conn: &Connection, alert_id: &str, logs: &[NotificationLog]) -> VigilResult<()> {
    write_logs(
        conn,
        alert_id,
        logs,
        "INSERT OR IGNORE INTO notification_logs
            (id, alert_id, kind, channel, recipient, sent_at, status, attempts, message, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
}

/// Insert log entries, replacing the delivery outcome of entries with the
/// same id.
pub fn upsert_notifications(conn: &Connection, alert_id: &str, logs: &[NotificationLog]) -> VigilResult<()> {
    write_logs(
        conn,
        alert_id,
        logs,
        "INSERT INTO notification_logs
            (id, alert_id, kind, channel, recipient, sent_at, status, attempts, message, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
            sent_at = excluded.sent_at,
            status = excluded.status,
            attempts = excluded.attempts,
            error = excluded.error",
    )
}

fn write_logs(conn: &Connection, alert_id: &str, logs: &[NotificationLog], sql: &str) -> VigilResult<()> {
    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;

    for log in logs {
        stmt.execute(params![
            log.id,
            alert_id,
            log.kind.as_str(),
            log.channel.as_str(),
            log.recipient,
            ts(&log.sent_at),
            log.status.as_str(),
            log.attempts,
            log.message,
            log.error,
        ])
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Mark every pending entry failed. Returns the number of entries changed.
pub fn fail_pending(conn: &Connection, error: &str, at: &DateTime<Utc>) -> VigilResult<usize> {
    conn.execute(
        "UPDATE notification_logs SET status = ?1, error = ?2, sent_at = ?3 WHERE status = ?4",
        params![
            DeliveryStatus::Failed.as_str(),
            error,
            ts(at),
            DeliveryStatus::Pending.as_str()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
