//! Connection management: write-serialized + read-pooled.

pub mod pool;
pub mod pragmas;
pub mod writer;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, Transaction};

use vigil_core::config::StorageConfig;
use vigil_core::errors::VigilResult;

use self::pool::ReadPool;
use self::pragmas::apply_pragmas;
use crate::{migrations, to_storage_err};

/// Owns the single write connection and, for file-backed databases, the
/// read pool. In-memory databases route reads through the writer.
pub struct DatabaseManager {
    writer: Mutex<Connection>,
    readers: Option<ReadPool>,
}

impl DatabaseManager {
    /// Open a database at the given path, apply pragmas, run migrations.
    pub fn open(path: &Path, read_pool_size: usize) -> VigilResult<Self> {
        let writer = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&writer)?;
        migrations::run_migrations(&writer)?;

        let readers = ReadPool::open(path, read_pool_size)?;
        tracing::debug!(path = %path.display(), readers = readers.size(), "database opened");

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Some(readers),
        })
    }

    pub fn from_config(config: &StorageConfig) -> VigilResult<Self> {
        Self::open(Path::new(&config.db_path), config.read_pool_size)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> VigilResult<Self> {
        let writer = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&writer)?;
        migrations::run_migrations(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: None,
        })
    }

    /// Execute a write operation with the serialized writer connection.
    pub fn with_writer<F, T>(&self, f: F) -> VigilResult<T>
    where
        F: FnOnce(&Connection) -> VigilResult<T>,
    {
        let guard = self
            .writer
            .lock()
            .map_err(|_| to_storage_err("write lock poisoned"))?;
        f(&guard)
    }

    /// Execute `f` on the writer inside one BEGIN IMMEDIATE transaction.
    pub fn with_transaction<F, T>(&self, f: F) -> VigilResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> VigilResult<T>,
    {
        self.with_writer(|conn| writer::with_immediate_transaction(conn, f))
    }

    /// Execute a read operation with a pooled read connection.
    pub fn with_reader<F, T>(&self, f: F) -> VigilResult<T>
    where
        F: FnOnce(&Connection) -> VigilResult<T>,
    {
        match &self.readers {
            Some(pool) => pool.with_conn(f),
            None => self.with_writer(f),
        }
    }
}
