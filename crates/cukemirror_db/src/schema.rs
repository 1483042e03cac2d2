//! Database schema creation for all mirror tables.
//!
//! All CREATE TABLE statements live here - single source of truth.

use crate::error::Result;
use crate::MirrorDb;
use tracing::debug;

impl MirrorDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        self.create_user_tables().await?;
        self.create_mirror_tables().await?;

        debug!("Mirror schema verified");
        Ok(())
    }

    /// Users own upstream credentials and the cached project list.
    async fn create_user_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                client_id TEXT NOT NULL DEFAULT '',
                access_token TEXT NOT NULL DEFAULT '',
                projects TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Folder and scenario mirrors, keyed by scope so two users mirroring
    /// the same project never share rows.
    async fn create_mirror_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS folders (
                project_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                id TEXT NOT NULL,
                name TEXT NOT NULL,
                parent_id TEXT,
                synced_at INTEGER NOT NULL,
                PRIMARY KEY (project_id, user_id, id)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        // `tags` keeps the serialized tag list handed back to callers;
        // scenario_tags indexes the same pairs for equality filtering.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS scenarios (
                project_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                id TEXT NOT NULL,
                name TEXT NOT NULL,
                folder_id INTEGER NOT NULL,
                tags TEXT,
                synced_at INTEGER NOT NULL,
                PRIMARY KEY (project_id, user_id, id)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS scenario_tags (
                project_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                scenario_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                tag_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (project_id, user_id, scenario_id, position)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_scenarios_folder ON scenarios(project_id, user_id, folder_id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_scenario_tags_pair ON scenario_tags(project_id, user_id, key, value)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
