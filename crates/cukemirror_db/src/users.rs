//! User accounts: upstream credentials and the cached project list.

use crate::error::{DbError, Result};
use crate::MirrorDb;
use cukemirror_protocol::{Project, UserAccount};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, warn};

const SELECT_USER: &str = "SELECT id, email, client_id, access_token, projects FROM users";

impl MirrorDb {
    /// Register a user. Emails are unique.
    pub async fn create_user(
        &self,
        email: &str,
        client_id: &str,
        access_token: &str,
    ) -> Result<UserAccount> {
        let now = Self::now_millis();
        let result = sqlx::query(
            "INSERT INTO users (email, client_id, access_token, projects, created_at, updated_at) VALUES (?, ?, ?, '[]', ?, ?)",
        )
        .bind(email)
        .bind(client_id)
        .bind(access_token)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DbError::constraint(format!("user {email} already exists"))
            }
            other => DbError::Sqlx(other),
        })?;

        let id = result.last_insert_rowid();
        info!(user_id = id, email, "User created");

        Ok(UserAccount {
            id,
            email: email.to_string(),
            client_id: client_id.to_string(),
            access_token: access_token.to_string(),
            projects: Vec::new(),
        })
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<UserAccount>> {
        let sql = format!("{SELECT_USER} WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_user))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let sql = format!("{SELECT_USER} WHERE email = ?");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_user))
    }

    /// Like [`get_user`](Self::get_user), but a missing user is an error.
    pub async fn require_user(&self, user_id: i64) -> Result<UserAccount> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| DbError::not_found(format!("user {user_id}")))
    }

    /// Overwrite the cached project list of a user.
    pub async fn update_user_projects(&self, user_id: i64, projects: &[Project]) -> Result<()> {
        let payload = serde_json::to_string(projects)?;
        let result = sqlx::query("UPDATE users SET projects = ?, updated_at = ? WHERE id = ?")
            .bind(payload)
            .bind(Self::now_millis())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("user {user_id}")));
        }
        Ok(())
    }

    pub async fn update_user_credentials(
        &self,
        user_id: i64,
        client_id: &str,
        access_token: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET client_id = ?, access_token = ?, updated_at = ? WHERE id = ?",
        )
        .bind(client_id)
        .bind(access_token)
        .bind(Self::now_millis())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("user {user_id}")));
        }
        Ok(())
    }

    /// Projects cached by the last project refresh.
    pub async fn cached_projects(&self, user_id: i64) -> Result<Vec<Project>> {
        Ok(self.require_user(user_id).await?.projects)
    }
}

fn row_to_user(row: &SqliteRow) -> UserAccount {
    let id: i64 = row.get("id");
    let raw: String = row.get("projects");
    let projects = match serde_json::from_str::<Vec<Project>>(&raw) {
        Ok(projects) => projects,
        Err(err) => {
            warn!(user_id = id, error = %err, "Cached project list is unreadable, ignoring it");
            Vec::new()
        }
    };

    UserAccount {
        id,
        email: row.get("email"),
        client_id: row.get("client_id"),
        access_token: row.get("access_token"),
        projects,
    }
}
