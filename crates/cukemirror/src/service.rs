//! Read side of the mirror: folder hierarchy and scenario queries.

use crate::error::Result;
use cukemirror_db::{MirrorDb, ScenarioQuery};
use cukemirror_protocol::{build_hierarchy, FolderForest, Scenario, Scope};
use tracing::warn;

/// Folders of a scope assembled into a forest.
pub async fn folders_hierarchy(db: &MirrorDb, scope: Scope) -> Result<FolderForest> {
    let folders = db.folders(scope).await?;
    let forest = build_hierarchy(&folders);

    if !forest.cyclic.is_empty() {
        warn!(
            %scope,
            unreachable = forest.cyclic.len(),
            "Folder hierarchy contains cycles, affected folders are not part of the tree"
        );
    }
    Ok(forest)
}

pub async fn scenarios(db: &MirrorDb, scope: Scope, query: &ScenarioQuery) -> Result<Vec<Scenario>> {
    Ok(db.scenarios(scope, query).await?)
}

pub async fn scenarios_by_project(db: &MirrorDb, scope: Scope) -> Result<Vec<Scenario>> {
    scenarios(db, scope, &ScenarioQuery::All).await
}

pub async fn scenarios_by_folder(db: &MirrorDb, scope: Scope, folder_id: i64) -> Result<Vec<Scenario>> {
    scenarios(db, scope, &ScenarioQuery::Folder(folder_id)).await
}

pub async fn scenarios_by_tags(db: &MirrorDb, scope: Scope, tags: &[String]) -> Result<Vec<Scenario>> {
    scenarios(db, scope, &ScenarioQuery::Tags(tags.to_vec())).await
}

pub async fn scenarios_by_name(db: &MirrorDb, scope: Scope, keyword: &str) -> Result<Vec<Scenario>> {
    scenarios(db, scope, &ScenarioQuery::Name(keyword.to_string())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use cukemirror_db::ReplaceStrategy;
    use cukemirror_protocol::Folder;

    #[tokio::test]
    async fn test_hierarchy_from_store() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let scope = Scope::new(1, 1);
        let folders = vec![
            Folder::new("3", "Leaf", Some("2")),
            Folder::new("1", "Root", None),
            Folder::new("2", "Mid", Some("1")),
            Folder::new("x", "Orphan", Some("missing")),
        ];
        db.replace_folders(scope, &folders, ReplaceStrategy::Atomic)
            .await
            .unwrap();

        let forest = folders_hierarchy(&db, scope).await.unwrap();
        let roots: Vec<&str> = forest.roots.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(roots, vec!["1", "x"]);
        assert_eq!(forest.roots[0].children[0].children[0].id, "3");
        assert_eq!(forest.dangling, vec!["x".to_string()]);
        assert!(forest.cyclic.is_empty());
    }

    #[tokio::test]
    async fn test_empty_scope_has_empty_forest() {
        let db = MirrorDb::open_in_memory().await.unwrap();
        let forest = folders_hierarchy(&db, Scope::new(1, 1)).await.unwrap();
        assert!(forest.roots.is_empty());
        assert_eq!(forest.node_count(), 0);
    }
}
