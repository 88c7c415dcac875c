//! # vigil-storage
//!
//! SQLite persistence layer for Vigil.
//! Single serialized writer, round-robin read pool, `user_version` migrations,
//! and [`SqliteAlertStore`], the production `IAlertStore`.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod store;

pub use connection::DatabaseManager;
pub use store::SqliteAlertStore;

use vigil_core::errors::{StorageError, VigilError};

/// Wrap a SQLite failure message as a `VigilError`.
pub fn to_storage_err(message: impl Into<String>) -> VigilError {
    StorageError::SqliteError {
        message: message.into(),
    }
    .into()
}
