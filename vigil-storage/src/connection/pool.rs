//! ReadPool: round-robin read-only connections.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags};

use vigil_core::errors::VigilResult;

use super::pragmas::apply_read_pragmas;
use crate::to_storage_err;

const MAX_POOL_SIZE: usize = 16;

/// A pool of read-only SQLite connections with round-robin selection.
pub struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    /// Open `pool_size` read-only connections (clamped to `1..=16`).
    pub fn open(path: &Path, pool_size: usize) -> VigilResult<Self> {
        let size = pool_size.clamp(1, MAX_POOL_SIZE);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| to_storage_err(format!("open reader: {e}")))?;
            apply_read_pragmas(&conn)?;
            connections.push(Mutex::new(conn));
        }
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    /// Execute a closure with a read connection (round-robin).
    pub fn with_conn<F, T>(&self, f: F) -> VigilResult<T>
    where
        F: FnOnce(&Connection) -> VigilResult<T>,
    {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        let guard = self.connections[idx]
            .lock()
            .map_err(|_| to_storage_err("read pool lock poisoned"))?;
        f(&guard)
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }
}
