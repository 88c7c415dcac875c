//! Write connection utilities: BEGIN IMMEDIATE transactions.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use vigil_core::errors::VigilResult;

use crate::to_storage_err;

/// Execute `f` inside a BEGIN IMMEDIATE transaction.
///
/// The write lock is taken at transaction start. Commits when `f` returns
/// `Ok`; any `Err` drops the transaction, which rolls it back.
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> VigilResult<T>
where
    F: FnOnce(&Transaction<'_>) -> VigilResult<T>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| to_storage_err(format!("failed to begin immediate transaction: {e}")))?;

    let result = f(&tx)?;

    tx.commit()
        .map_err(|e| to_storage_err(format!("failed to commit: {e}")))?;
    Ok(result)
}
