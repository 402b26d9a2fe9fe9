//! Database-specific error types and conversions.

use comanager_core::error::ComanagerError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violated on {entity}")]
    Conflict { entity: String },

    #[error("Stored record is malformed: {0}")]
    Decode(String),
}

impl DbError {
    /// Classify an error raised by a write statement. Unique index
    /// violations become [`DbError::Conflict`].
    pub(crate) fn from_write(entity: &str, err: surrealdb::Error) -> Self {
        if err.to_string().contains("already contains") {
            DbError::Conflict {
                entity: entity.into(),
            }
        } else {
            DbError::Surreal(err)
        }
    }
}

impl From<DbError> for ComanagerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ComanagerError::NotFound { entity, id },
            DbError::Conflict { entity } => ComanagerError::AlreadyExists { entity },
            other => ComanagerError::Database(other.to_string()),
        }
    }
}
