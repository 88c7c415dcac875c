//! Remediation actions attached to an alert, stored in list order.

use rusqlite::{params, Connection, Row};

use vigil_core::errors::VigilResult;
use vigil_core::models::{ActionStatus, AlertAction};

use super::{opt_ts, parse_name, parse_opt_ts, parse_ts, ts};
use crate::to_storage_err;

struct ActionRow {
    id: String,
    description: String,
    assignee: String,
    due_date: Option<String>,
    status: String,
    created_at: String,
    completed_at: Option<String>,
    completed_by: Option<String>,
}

impl ActionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            description: row.get(1)?,
            assignee: row.get(2)?,
            due_date: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
            completed_at: row.get(6)?,
            completed_by: row.get(7)?,
        })
    }

    fn into_action(self) -> VigilResult<AlertAction> {
        Ok(AlertAction {
            id: self.id,
            description: self.description,
            assignee: self.assignee,
            due_date: parse_opt_ts("due_date", self.due_date)?,
            status: parse_name("status", &self.status, ActionStatus::parse)?,
            created_at: parse_ts("created_at", &self.created_at)?,
            completed_at: parse_opt_ts("completed_at", self.completed_at)?,
            completed_by: self.completed_by,
        })
    }
}

pub fn list_actions(conn: &Connection, alert_id: &str) -> VigilResult<Vec<AlertAction>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, description, assignee, due_date, status, created_at, completed_at, completed_by
             FROM alert_actions WHERE alert_id = ?1 ORDER BY position",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([alert_id], ActionRow::read)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.into_iter().map(ActionRow::into_action).collect()
}

/// Write the full action list. New actions are inserted, existing ones updated.
pub fn upsert_actions(conn: &Connection, alert_id: &str, actions: &[AlertAction]) -> VigilResult<()> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO alert_actions
                (id, alert_id, position, description, assignee, due_date, status,
                 created_at, completed_at, completed_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                description = excluded.description,
                assignee = excluded.assignee,
                due_date = excluded.due_date,
                status = excluded.status,
                completed_at = excluded.completed_at,
                completed_by = excluded.completed_by",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    for (position, action) in actions.iter().enumerate() {
        stmt.execute(params![
            action.id,
            alert_id,
            position as i64,
            action.description,
            action.assignee,
            opt_ts(action.due_date.as_ref()),
            action.status.as_str(),
            ts(&action.created_at),
            opt_ts(action.completed_at.as_ref()),
            action.completed_by,
        ])
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}
