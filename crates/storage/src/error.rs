use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(
        "Write to {table}.{field} for row {row_id} did not persist: expected {expected}, read back {actual}"
    )]
    PersistenceMismatch {
        table: &'static str,
        row_id: Uuid,
        field: String,
        expected: Value,
        actual: Value,
    },

    #[error(
        "Rank rewrite for event {event_id} only partially applied: {written} written, {} failed",
        .failed.len()
    )]
    PartialBatch {
        event_id: Uuid,
        written: usize,
        failed: Vec<BatchFailure>,
    },

    #[error("Store call {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// One row of a batch write that could not be applied.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub row_id: Uuid,
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        ) || matches!(self, StorageError::Conflict(_))
    }
}
