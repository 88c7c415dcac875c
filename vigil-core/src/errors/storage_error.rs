//! Storage-layer errors for SQLite operations.

use super::error_code::{self, VigilErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("corrupt value in column {column}: {value}")]
    CorruptValue { column: String, value: String },

    #[error("an open alert already exists for obligation {obligation_id} ({obligation_type})")]
    DuplicateOpenAlert {
        obligation_id: String,
        obligation_type: String,
    },
}

impl VigilErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateOpenAlert { .. } => error_code::DUPLICATE_OPEN_ALERT,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
