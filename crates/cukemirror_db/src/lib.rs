//! Local mirror store for cukemirror.
//!
//! Persists upstream folders and scenarios per `(project_id, user_id)` scope,
//! plus the users that own upstream credentials. Every component receives a
//! [`MirrorDb`] handle explicitly; there is no process-wide connection.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cukemirror_db::{MirrorDb, ReplaceStrategy, ScenarioQuery};
//! use cukemirror_protocol::Scope;
//!
//! let db = MirrorDb::open("~/.cukemirror/mirror.sqlite").await?;
//! let scope = Scope::new(42, 1);
//!
//! db.replace_folders(scope, &folders, ReplaceStrategy::Atomic).await?;
//! let flat = db.folders(scope).await?;
//! let smoke = db.scenarios(scope, &ScenarioQuery::Tags(vec!["type:smoke".into()])).await?;
//! ```

mod error;
mod schema;
mod types;

// Method implementations organized by table
mod folders;
mod scenarios;
mod users;

pub use error::{DbError, Result};
pub use types::{ReplaceReport, ReplaceStrategy, ScenarioQuery};

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the mirror database. Cheap to clone.
#[derive(Clone)]
pub struct MirrorDb {
    pool: SqlitePool,
}

impl MirrorDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Mirror database opened");

        Ok(db)
    }

    /// Open a private in-memory database.
    ///
    /// The pool is pinned to a single connection that never expires, since
    /// each SQLite in-memory connection is its own database.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Get the underlying connection pool (escape hatch for complex queries).
    ///
    /// Prefer using the typed methods instead.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Current time as milliseconds since Unix epoch.
    pub(crate) fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_database() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("nested").join("mirror.sqlite");

        let db = MirrorDb::open(&db_path).await.unwrap();
        assert!(db_path.exists());

        db.close().await;
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("mirror.sqlite");

        let db = MirrorDb::open(&db_path).await.unwrap();
        db.create_user("qa@example.com", "client", "token")
            .await
            .unwrap();
        db.close().await;

        let db = MirrorDb::open(&db_path).await.unwrap();
        let user = db.find_user_by_email("qa@example.com").await.unwrap();
        assert!(user.is_some());
        db.close().await;
    }
}
