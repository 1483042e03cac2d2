//! Error types for the mirror store.

use cukemirror_protocol::MirrorKind;
use thiserror::Error;

/// Store operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Store errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation (unique, foreign key, etc.)
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A row insert during scope replacement failed; remaining inserts were
    /// abandoned. `persisted` counts rows of the new snapshot left in place
    /// (always 0 when the replacement was transactional).
    #[error("Failed to insert {kind} row {id} ({persisted} new rows persisted): {source}")]
    InsertFailed {
        kind: MirrorKind,
        id: String,
        persisted: usize,
        #[source]
        source: sqlx::Error,
    },
}

impl DbError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a constraint error.
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    pub(crate) fn insert_failed(
        kind: MirrorKind,
        id: &str,
        persisted: usize,
        source: sqlx::Error,
    ) -> Self {
        Self::InsertFailed {
            kind,
            id: id.to_string(),
            persisted,
            source,
        }
    }
}
