//! Scenario mirror operations.
//!
//! Tags are written twice: as a serialized JSON list on the scenario row (the
//! payload returned to callers) and as one `scenario_tags` row per tag, which
//! tag filters query by equality.

use crate::error::{DbError, Result};
use crate::types::{ReplaceReport, ReplaceStrategy, ScenarioQuery};
use crate::MirrorDb;
use cukemirror_protocol::{matches_all_tags, parse_tag_filters, MirrorKind, Scenario, Scope, Tag};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{debug, warn};

const SELECT_SCENARIOS: &str =
    "SELECT s.id, s.name, s.folder_id, s.project_id, s.tags FROM scenarios s WHERE s.project_id = ? AND s.user_id = ?";

const TAG_PAIR_EXISTS: &str = " AND EXISTS (SELECT 1 FROM scenario_tags t \
     WHERE t.project_id = s.project_id AND t.user_id = s.user_id AND t.scenario_id = s.id \
     AND t.key = ? AND t.value = ?)";

impl MirrorDb {
    /// Scenarios of a scope selected by `query`, in insertion order.
    pub async fn scenarios(&self, scope: Scope, query: &ScenarioQuery) -> Result<Vec<Scenario>> {
        match query {
            ScenarioQuery::All => self.scenarios_for_scope(scope).await,
            ScenarioQuery::Folder(folder_id) => self.scenarios_by_folder(scope, *folder_id).await,
            ScenarioQuery::Name(keyword) => self.scenarios_by_name(scope, keyword).await,
            ScenarioQuery::Tags(filters) => self.scenarios_by_tags(scope, filters).await,
        }
    }

    pub async fn scenarios_for_scope(&self, scope: Scope) -> Result<Vec<Scenario>> {
        let sql = format!("{SELECT_SCENARIOS} ORDER BY s.rowid");
        let rows = sqlx::query(&sql)
            .bind(scope.project_id)
            .bind(scope.user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_scenario).collect())
    }

    pub async fn scenarios_by_folder(&self, scope: Scope, folder_id: i64) -> Result<Vec<Scenario>> {
        let sql = format!("{SELECT_SCENARIOS} AND s.folder_id = ? ORDER BY s.rowid");
        let rows = sqlx::query(&sql)
            .bind(scope.project_id)
            .bind(scope.user_id)
            .bind(folder_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_scenario).collect())
    }

    /// Case-insensitive substring search on scenario names.
    ///
    /// Case folding follows SQLite `LIKE`, i.e. ASCII only. `%` and `_` in the
    /// keyword match literally.
    pub async fn scenarios_by_name(&self, scope: Scope, keyword: &str) -> Result<Vec<Scenario>> {
        let sql = format!("{SELECT_SCENARIOS} AND s.name LIKE ? ESCAPE '\\' ORDER BY s.rowid");
        let pattern = format!("%{}%", escape_like(keyword));
        let rows = sqlx::query(&sql)
            .bind(scope.project_id)
            .bind(scope.user_id)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_scenario).collect())
    }

    /// Scenarios carrying every `"key:value"` filter.
    ///
    /// An empty filter list returns nothing. Malformed filters are skipped.
    pub async fn scenarios_by_tags<S: AsRef<str>>(
        &self,
        scope: Scope,
        filters: &[S],
    ) -> Result<Vec<Scenario>> {
        if filters.is_empty() {
            return Ok(Vec::new());
        }

        let parsed = parse_tag_filters(filters);
        let mut sql = String::from(SELECT_SCENARIOS);
        for _ in &parsed {
            sql.push_str(TAG_PAIR_EXISTS);
        }
        sql.push_str(" ORDER BY s.rowid");

        let mut query = sqlx::query(&sql).bind(scope.project_id).bind(scope.user_id);
        for filter in &parsed {
            query = query.bind(filter.key.clone()).bind(filter.value.clone());
        }
        let rows = query.fetch_all(&self.pool).await?;

        // Confirm against the decoded payload; a row whose tags failed to
        // decode carries no tags and drops out here.
        Ok(rows
            .iter()
            .map(row_to_scenario)
            .filter(|scenario| matches_all_tags(&scenario.tags, filters))
            .collect())
    }

    pub async fn scenario_count(&self, scope: Scope) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM scenarios WHERE project_id = ? AND user_id = ?")
                .bind(scope.project_id)
                .bind(scope.user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Insert one scenario (row and tag index) into a scope.
    pub async fn insert_scenario(&self, scope: Scope, scenario: &Scenario) -> Result<()> {
        let tags_json = serde_json::to_string(&scenario.tags)?;
        let mut tx = self.pool.begin().await?;
        insert_scenario_rows(&mut *tx, scope, scenario, &tags_json, Self::now_millis()).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Delete every scenario in a scope. Returns the number of scenarios removed.
    pub async fn delete_scenarios(&self, scope: Scope) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let deleted = delete_scenario_rows(&mut *tx, scope).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    /// Replace the scenario snapshot of a scope.
    pub async fn replace_scenarios(
        &self,
        scope: Scope,
        scenarios: &[Scenario],
        strategy: ReplaceStrategy,
    ) -> Result<ReplaceReport> {
        // Serialize up front so an encoding problem never leaves a half-written scope.
        let encoded = scenarios
            .iter()
            .map(|scenario| serde_json::to_string(&scenario.tags))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match strategy {
            ReplaceStrategy::Atomic => self.replace_scenarios_atomic(scope, scenarios, &encoded).await,
            ReplaceStrategy::BestEffort => {
                self.replace_scenarios_best_effort(scope, scenarios, &encoded)
                    .await
            }
        }
    }

    async fn replace_scenarios_atomic(
        &self,
        scope: Scope,
        scenarios: &[Scenario],
        encoded_tags: &[String],
    ) -> Result<ReplaceReport> {
        let synced_at = Self::now_millis();
        let mut tx = self.pool.begin().await?;

        let deleted = delete_scenario_rows(&mut *tx, scope).await?;

        for (scenario, tags_json) in scenarios.iter().zip(encoded_tags) {
            if let Err(err) = insert_scenario_rows(&mut *tx, scope, scenario, tags_json, synced_at).await {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(%scope, error = %rollback_err, "Scenario replacement rollback failed");
                }
                return Err(DbError::insert_failed(MirrorKind::Scenarios, &scenario.id, 0, err));
            }
        }

        tx.commit().await?;
        debug!(%scope, deleted, inserted = scenarios.len(), "Scenarios replaced atomically");

        Ok(ReplaceReport {
            strategy: ReplaceStrategy::Atomic,
            deleted,
            inserted: scenarios.len(),
            delete_error: None,
        })
    }

    async fn replace_scenarios_best_effort(
        &self,
        scope: Scope,
        scenarios: &[Scenario],
        encoded_tags: &[String],
    ) -> Result<ReplaceReport> {
        let synced_at = Self::now_millis();

        let (deleted, delete_error) = match self.delete_scenarios(scope).await {
            Ok(deleted) => (deleted, None),
            Err(err) => {
                warn!(%scope, error = %err, "Failed to delete existing scenarios, inserting anyway");
                (0, Some(err.to_string()))
            }
        };

        // One short transaction per scenario keeps each row and its tag index together.
        for (persisted, (scenario, tags_json)) in scenarios.iter().zip(encoded_tags).enumerate() {
            if let Err(err) = self.insert_scenario_committed(scope, scenario, tags_json, synced_at).await {
                warn!(%scope, scenario_id = %scenario.id, error = %err, "Failed to create scenario, aborting refresh");
                return Err(DbError::insert_failed(
                    MirrorKind::Scenarios,
                    &scenario.id,
                    persisted,
                    err,
                ));
            }
        }

        Ok(ReplaceReport {
            strategy: ReplaceStrategy::BestEffort,
            deleted,
            inserted: scenarios.len(),
            delete_error,
        })
    }

    async fn insert_scenario_committed(
        &self,
        scope: Scope,
        scenario: &Scenario,
        tags_json: &str,
        synced_at: i64,
    ) -> std::result::Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        insert_scenario_rows(&mut *tx, scope, scenario, tags_json, synced_at).await?;
        tx.commit().await
    }
}

fn row_to_scenario(row: &SqliteRow) -> Scenario {
    let id: String = row.get("id");
    let tags_json: Option<String> = row.get("tags");
    Scenario {
        tags: decode_tags(&id, tags_json.as_deref()),
        id,
        name: row.get("name"),
        folder_id: row.get("folder_id"),
        project_id: row.get("project_id"),
    }
}

/// Decode a row's serialized tags. A bad payload costs the row its tags,
/// never the row itself.
fn decode_tags(scenario_id: &str, raw: Option<&str>) -> Vec<Tag> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Tag>>(raw) {
        Ok(tags) => tags,
        Err(err) => {
            warn!(scenario_id, error = %err, "Error unmarshaling tags for scenario");
            Vec::new()
        }
    }
}

fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for ch in keyword.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

async fn insert_scenario_rows(
    conn: &mut SqliteConnection,
    scope: Scope,
    scenario: &Scenario,
    tags_json: &str,
    synced_at: i64,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO scenarios (project_id, user_id, id, name, folder_id, tags, synced_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(scope.project_id)
    .bind(scope.user_id)
    .bind(&scenario.id)
    .bind(&scenario.name)
    .bind(scenario.folder_id)
    .bind(tags_json)
    .bind(synced_at)
    .execute(&mut *conn)
    .await?;

    for (position, tag) in scenario.tags.iter().enumerate() {
        sqlx::query(
            "INSERT INTO scenario_tags (project_id, user_id, scenario_id, position, tag_id, key, value) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(scope.project_id)
        .bind(scope.user_id)
        .bind(&scenario.id)
        .bind(position as i64)
        .bind(&tag.id)
        .bind(&tag.key)
        .bind(&tag.value)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn delete_scenario_rows(
    conn: &mut SqliteConnection,
    scope: Scope,
) -> std::result::Result<u64, sqlx::Error> {
    sqlx::query("DELETE FROM scenario_tags WHERE project_id = ? AND user_id = ?")
        .bind(scope.project_id)
        .bind(scope.user_id)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query("DELETE FROM scenarios WHERE project_id = ? AND user_id = ?")
        .bind(scope.project_id)
        .bind(scope.user_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
