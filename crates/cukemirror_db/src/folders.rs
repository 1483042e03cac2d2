//! Folder mirror operations.

use crate::error::{DbError, Result};
use crate::types::{ReplaceReport, ReplaceStrategy};
use crate::MirrorDb;
use cukemirror_protocol::{Folder, MirrorKind, Scope};
use sqlx::{Row, SqliteConnection};
use tracing::{debug, warn};

impl MirrorDb {
    /// All folders of a scope, flat, in insertion order.
    pub async fn folders(&self, scope: Scope) -> Result<Vec<Folder>> {
        let rows = sqlx::query(
            "SELECT id, name, parent_id FROM folders WHERE project_id = ? AND user_id = ? ORDER BY rowid",
        )
        .bind(scope.project_id)
        .bind(scope.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Folder {
                id: row.get("id"),
                name: row.get("name"),
                parent_id: row.get("parent_id"),
            })
            .collect())
    }

    pub async fn folder_count(&self, scope: Scope) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE project_id = ? AND user_id = ?")
                .bind(scope.project_id)
                .bind(scope.user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Insert a single folder into a scope.
    pub async fn insert_folder(&self, scope: Scope, folder: &Folder) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_folder_row(&mut *conn, scope, folder, Self::now_millis()).await?;
        Ok(())
    }

    /// Delete every folder in a scope. Returns the number of rows removed.
    pub async fn delete_folders(&self, scope: Scope) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        Ok(delete_folder_rows(&mut *conn, scope).await?)
    }

    /// Replace the folder snapshot of a scope.
    pub async fn replace_folders(
        &self,
        scope: Scope,
        folders: &[Folder],
        strategy: ReplaceStrategy,
    ) -> Result<ReplaceReport> {
        match strategy {
            ReplaceStrategy::Atomic => self.replace_folders_atomic(scope, folders).await,
            ReplaceStrategy::BestEffort => self.replace_folders_best_effort(scope, folders).await,
        }
    }

    async fn replace_folders_atomic(&self, scope: Scope, folders: &[Folder]) -> Result<ReplaceReport> {
        let synced_at = Self::now_millis();
        let mut tx = self.pool.begin().await?;

        let deleted = delete_folder_rows(&mut *tx, scope).await?;

        for folder in folders {
            if let Err(err) = insert_folder_row(&mut *tx, scope, folder, synced_at).await {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(%scope, error = %rollback_err, "Folder replacement rollback failed");
                }
                return Err(DbError::insert_failed(MirrorKind::Folders, &folder.id, 0, err));
            }
        }

        tx.commit().await?;
        debug!(%scope, deleted, inserted = folders.len(), "Folders replaced atomically");

        Ok(ReplaceReport {
            strategy: ReplaceStrategy::Atomic,
            deleted,
            inserted: folders.len(),
            delete_error: None,
        })
    }

    async fn replace_folders_best_effort(
        &self,
        scope: Scope,
        folders: &[Folder],
    ) -> Result<ReplaceReport> {
        let synced_at = Self::now_millis();
        let mut conn = self.pool.acquire().await?;

        let (deleted, delete_error) = match delete_folder_rows(&mut *conn, scope).await {
            Ok(deleted) => (deleted, None),
            Err(err) => {
                warn!(%scope, error = %err, "Error deleting existing folders, inserting anyway");
                (0, Some(err.to_string()))
            }
        };

        for (persisted, folder) in folders.iter().enumerate() {
            if let Err(err) = insert_folder_row(&mut *conn, scope, folder, synced_at).await {
                warn!(%scope, folder_id = %folder.id, error = %err, "Error creating folder, aborting refresh");
                return Err(DbError::insert_failed(
                    MirrorKind::Folders,
                    &folder.id,
                    persisted,
                    err,
                ));
            }
            debug!(%scope, folder_id = %folder.id, "Folder created");
        }

        Ok(ReplaceReport {
            strategy: ReplaceStrategy::BestEffort,
            deleted,
            inserted: folders.len(),
            delete_error,
        })
    }
}

async fn insert_folder_row(
    conn: &mut SqliteConnection,
    scope: Scope,
    folder: &Folder,
    synced_at: i64,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO folders (project_id, user_id, id, name, parent_id, synced_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(scope.project_id)
    .bind(scope.user_id)
    .bind(&folder.id)
    .bind(&folder.name)
    .bind(folder.parent_id.as_deref())
    .bind(synced_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn delete_folder_rows(
    conn: &mut SqliteConnection,
    scope: Scope,
) -> std::result::Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM folders WHERE project_id = ? AND user_id = ?")
        .bind(scope.project_id)
        .bind(scope.user_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, parent: Option<&str>) -> Folder {
        Folder::new(id, format!("Folder {id}"), parent)
    }

    #[tokio::test]
    async fn test_folders_are_returned_in_insert_order() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let scope = Scope::new(1, 1);
        let snapshot = vec![folder("b", None), folder("a", Some("b")), folder("c", Some("zz"))];

        db.replace_folders(scope, &snapshot, ReplaceStrategy::Atomic)
            .await
            .unwrap();

        assert_eq!(db.folders(scope).await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_scope_isolation() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let alice = Scope::new(1, 10);
        let bob = Scope::new(1, 20);

        db.replace_folders(alice, &[folder("1", None)], ReplaceStrategy::Atomic)
            .await
            .unwrap();
        // Same upstream ids for another user must not collide.
        db.replace_folders(bob, &[folder("1", None), folder("2", Some("1"))], ReplaceStrategy::Atomic)
            .await
            .unwrap();

        assert_eq!(db.folders(alice).await.unwrap().len(), 1);
        assert_eq!(db.folders(bob).await.unwrap().len(), 2);
        assert!(db.folders(Scope::new(2, 10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_does_not_append() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let scope = Scope::new(5, 1);

        db.replace_folders(scope, &[folder("old", None)], ReplaceStrategy::Atomic)
            .await
            .unwrap();
        let report = db
            .replace_folders(scope, &[folder("new", None)], ReplaceStrategy::Atomic)
            .await
            .unwrap();

        assert_eq!(report.deleted, 1);
        assert_eq!(report.inserted, 1);
        let ids: Vec<String> = db.folders(scope).await.unwrap().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn test_atomic_replace_rolls_back_on_insert_failure() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let scope = Scope::new(5, 1);
        db.replace_folders(scope, &[folder("keep", None)], ReplaceStrategy::Atomic)
            .await
            .unwrap();

        // Duplicate id trips the primary key on the second insert.
        let bad = vec![folder("x", None), folder("x", None)];
        let err = db
            .replace_folders(scope, &bad, ReplaceStrategy::Atomic)
            .await
            .unwrap_err();

        match err {
            DbError::InsertFailed { id, persisted, .. } => {
                assert_eq!(id, "x");
                assert_eq!(persisted, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
        let ids: Vec<String> = db.folders(scope).await.unwrap().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["keep".to_string()]);
    }

    #[tokio::test]
    async fn test_best_effort_replace_keeps_partial_snapshot() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let scope = Scope::new(5, 1);
        db.replace_folders(scope, &[folder("old", None)], ReplaceStrategy::BestEffort)
            .await
            .unwrap();

        let bad = vec![folder("a", None), folder("b", None), folder("a", None), folder("c", None)];
        let err = db
            .replace_folders(scope, &bad, ReplaceStrategy::BestEffort)
            .await
            .unwrap_err();

        match err {
            DbError::InsertFailed { persisted, .. } => assert_eq!(persisted, 2),
            other => panic!("unexpected error: {other}"),
        }
        let ids: Vec<String> = db.folders(scope).await.unwrap().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    async fn block_folder_deletes(db: &MirrorDb) {
        sqlx::query(
            "CREATE TRIGGER block_folder_delete BEFORE DELETE ON folders BEGIN SELECT RAISE(ABORT, 'delete blocked'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();
    }

    fn folder_ids(folders: Vec<Folder>) -> Vec<String> {
        folders.into_iter().map(|f| f.id).collect()
    }

    #[tokio::test]
    async fn test_best_effort_delete_failure_still_inserts() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let scope = Scope::new(3, 1);
        db.replace_folders(scope, &[folder("old", None)], ReplaceStrategy::BestEffort)
            .await
            .unwrap();
        block_folder_deletes(&db).await;

        let report = db
            .replace_folders(scope, &[folder("new", None)], ReplaceStrategy::BestEffort)
            .await
            .unwrap();

        assert_eq!(report.deleted, 0);
        assert_eq!(report.inserted, 1);
        let delete_error = report.delete_error.expect("delete failure should be reported");
        assert!(delete_error.contains("delete blocked"), "{delete_error}");
        assert_eq!(folder_ids(db.folders(scope).await.unwrap()), vec!["old", "new"]);
    }

    #[tokio::test]
    async fn test_atomic_delete_failure_keeps_previous_snapshot() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let scope = Scope::new(3, 1);
        db.replace_folders(scope, &[folder("old", None)], ReplaceStrategy::Atomic)
            .await
            .unwrap();
        block_folder_deletes(&db).await;

        let err = db
            .replace_folders(scope, &[folder("new", None)], ReplaceStrategy::Atomic)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Sqlx(_)), "unexpected error: {err}");
        assert_eq!(folder_ids(db.folders(scope).await.unwrap()), vec!["old"]);
    }

    #[tokio::test]
    async fn test_insert_and_delete_single_folder() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let scope = Scope::new(9, 9);

        db.insert_folder(scope, &folder("1", None)).await.unwrap();
        assert_eq!(db.folder_count(scope).await.unwrap(), 1);
        assert_eq!(db.delete_folders(scope).await.unwrap(), 1);
        assert_eq!(db.folder_count(scope).await.unwrap(), 0);
    }
}
