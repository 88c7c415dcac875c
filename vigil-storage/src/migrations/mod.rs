//! Schema migrations keyed on `PRAGMA user_version`.
//! Each migration runs in its own transaction together with the version bump.

pub mod v001_initial;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use vigil_core::errors::{StorageError, VigilResult};

use crate::to_storage_err;

/// Ordered list of (version, sql).
const MIGRATIONS: &[(u32, &str)] = &[(1, v001_initial::MIGRATION_SQL)];

/// Highest schema version this build knows about.
pub const LATEST_VERSION: u32 = 1;

/// Read the schema version stored in the database header.
pub fn current_version(conn: &Connection) -> VigilResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Apply every pending migration. Returns the resulting version.
pub fn run_migrations(conn: &Connection) -> VigilResult<u32> {
    let start = current_version(conn)?;
    let mut version = start;

    for &(target, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > start) {
        let failed = |e: rusqlite::Error| StorageError::MigrationFailed {
            version: target,
            message: e.to_string(),
        };
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(failed)?;
        tx.execute_batch(sql).map_err(failed)?;
        tx.pragma_update(None, "user_version", target).map_err(failed)?;
        tx.commit().map_err(failed)?;

        version = target;
        tracing::info!(version, "applied migration");
    }

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), LATEST_VERSION);
        assert_eq!(run_migrations(&conn).unwrap(), LATEST_VERSION);
        assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
    }

    #[test]
    fn creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        for table in ["alert_rules", "compliance_alerts", "alert_actions", "notification_logs"] {
            let n: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(n, 1, "missing table {table}");
        }
    }
}
