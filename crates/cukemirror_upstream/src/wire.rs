//! JSON-API documents returned by the upstream, and their normalisation into
//! mirror entities.
//!
//! Only the fields the mirror needs are modelled; everything else in the
//! payload is ignored.

use cukemirror_protocol::{Folder, Project, Scenario, Tag};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// Resource type of side-loaded tags in `included`.
pub const TAG_RESOURCE_TYPE: &str = "tags";

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProjectsDocument {
    #[serde(default)]
    pub data: Vec<ProjectResource>,
}

#[derive(Debug, Deserialize)]
pub struct FoldersDocument {
    #[serde(default)]
    pub data: Vec<FolderResource>,
}

#[derive(Debug, Deserialize)]
pub struct ScenariosDocument {
    #[serde(default)]
    pub data: Vec<ScenarioResource>,
    #[serde(default)]
    pub included: Vec<IncludedResource>,
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProjectResource {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: NameAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct NameAttributes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FolderResource {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: FolderAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct FolderAttributes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Arrives as a number, a string, or null. Empty and null mean "root".
    #[serde(rename = "parent-id", default, deserialize_with = "optional_id")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioResource {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: ScenarioAttributes,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relationships: ScenarioRelationships,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScenarioAttributes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Null reads as 0, the same as a missing field.
    #[serde(rename = "folder-id", default, deserialize_with = "null_as_default")]
    pub folder_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScenarioRelationships {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: RelationshipList,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelationshipList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<ResourceRef>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct IncludedResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub attributes: Value,
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Null reads as the type's default, the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Normalisation
// ============================================================================

impl ProjectsDocument {
    pub fn into_projects(self) -> Vec<Project> {
        self.data
            .into_iter()
            .map(|p| Project {
                id: p.id,
                name: p.attributes.name,
            })
            .collect()
    }
}

impl FoldersDocument {
    pub fn into_folders(self) -> Vec<Folder> {
        self.data
            .into_iter()
            .map(|f| Folder {
                id: f.id,
                name: f.attributes.name,
                parent_id: f.attributes.parent_id,
            })
            .collect()
    }
}

impl ScenariosDocument {
    /// Resolve each scenario's tag relationships against the included tag
    /// resources. Relationships with no matching included tag are dropped.
    pub fn into_scenarios(self, project_id: i64) -> Vec<Scenario> {
        let tags = tag_lookup(&self.included);

        self.data
            .into_iter()
            .map(|resource| Scenario {
                tags: resource
                    .relationships
                    .tags
                    .data
                    .iter()
                    .filter_map(|rel| tags.get(rel.id.as_str()).cloned())
                    .collect(),
                id: resource.id,
                name: resource.attributes.name,
                folder_id: resource.attributes.folder_id,
                project_id,
            })
            .collect()
    }
}

fn tag_lookup(included: &[IncludedResource]) -> HashMap<&str, Tag> {
    included
        .iter()
        .filter(|inc| inc.kind == TAG_RESOURCE_TYPE)
        .map(|inc| {
            let key = string_attribute(&inc.attributes, "key");
            let value = string_attribute(&inc.attributes, "value");
            (inc.id.as_str(), Tag::new(inc.id.clone(), key, value))
        })
        .collect()
}

fn string_attribute(attributes: &Value, name: &str) -> String {
    match attributes.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projects_are_simplified() {
        let body = r#"{"data":[
            {"type":"projects","id":"42","attributes":{"name":"Checkout","description":"x"}},
            {"type":"projects","id":"43","attributes":{"name":"Search"}}
        ]}"#;
        let doc: ProjectsDocument = serde_json::from_str(body).unwrap();
        let projects = doc.into_projects();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id, "42");
        assert_eq!(projects[1].name, "Search");
    }

    #[test]
    fn test_folder_parent_id_shapes() {
        let body = r#"{"data":[
            {"type":"folders","id":"1","attributes":{"name":"Root","parent-id":null}},
            {"type":"folders","id":"2","attributes":{"name":"Num","parent-id":1}},
            {"type":"folders","id":"3","attributes":{"name":"Str","parent-id":"2"}},
            {"type":"folders","id":"4","attributes":{"name":"Empty","parent-id":""}},
            {"type":"folders","id":"5","attributes":{"name":"Missing"}}
        ]}"#;
        let doc: FoldersDocument = serde_json::from_str(body).unwrap();
        let parents: Vec<Option<String>> =
            doc.into_folders().into_iter().map(|f| f.parent_id).collect();

        assert_eq!(
            parents,
            vec![None, Some("1".to_string()), Some("2".to_string()), None, None]
        );
    }

    #[test]
    fn test_scenario_tags_resolve_against_included() {
        let body = r#"{
            "data":[
                {"type":"scenarios","id":"s1","attributes":{"name":"Login","folder-id":7},
                 "relationships":{"tags":{"data":[
                    {"type":"tags","id":"t2"},
                    {"type":"tags","id":"t1"},
                    {"type":"tags","id":"ghost"}
                 ]}}},
                {"type":"scenarios","id":"s2","attributes":{"name":"Bare","folder-id":8}}
            ],
            "included":[
                {"type":"tags","id":"t1","attributes":{"key":"type","value":"smoke"}},
                {"type":"tags","id":"t2","attributes":{"key":"team","value":"auth"}},
                {"type":"folders","id":"t3","attributes":{"name":"not a tag"}}
            ]
        }"#;
        let doc: ScenariosDocument = serde_json::from_str(body).unwrap();
        let scenarios = doc.into_scenarios(99);

        assert_eq!(scenarios.len(), 2);
        let s1 = &scenarios[0];
        assert_eq!(s1.folder_id, 7);
        assert_eq!(s1.project_id, 99);
        // Relationship order is kept and the unresolved "ghost" is dropped.
        let keys: Vec<&str> = s1.tags.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["team", "type"]);
        assert!(scenarios[1].tags.is_empty());
    }

    #[test]
    fn test_non_tag_included_resource_is_ignored() {
        let body = r#"{
            "data":[{"type":"scenarios","id":"s1","attributes":{"name":"A","folder-id":1},
                     "relationships":{"tags":{"data":[{"type":"tags","id":"x"}]}}}],
            "included":[{"type":"folders","id":"x","attributes":{"key":"k","value":"v"}}]
        }"#;
        let doc: ScenariosDocument = serde_json::from_str(body).unwrap();
        assert!(doc.into_scenarios(1)[0].tags.is_empty());
    }

    #[test]
    fn test_null_relationship_data() {
        let body = r#"{"data":[{"type":"scenarios","id":"s1","attributes":{"name":"A","folder-id":1},
                       "relationships":{"tags":{"data":null}}}]}"#;
        let doc: ScenariosDocument = serde_json::from_str(body).unwrap();
        assert!(doc.into_scenarios(1)[0].tags.is_empty());
    }

    #[test]
    fn test_null_attributes_read_as_defaults() {
        let body = r#"{"data":[
            {"type":"scenarios","id":"s1","attributes":{"name":"A","folder-id":null}},
            {"type":"scenarios","id":"s2","attributes":{"name":null,"folder-id":3}},
            {"type":"scenarios","id":"s3","attributes":null,"relationships":null}
        ]}"#;
        let doc: ScenariosDocument = serde_json::from_str(body).unwrap();
        let scenarios = doc.into_scenarios(5);

        assert_eq!(scenarios.len(), 3);
        assert_eq!((scenarios[0].name.as_str(), scenarios[0].folder_id), ("A", 0));
        assert_eq!((scenarios[1].name.as_str(), scenarios[1].folder_id), ("", 3));
        assert_eq!((scenarios[2].name.as_str(), scenarios[2].folder_id), ("", 0));

        let folders: FoldersDocument = serde_json::from_str(
            r#"{"data":[{"type":"folders","id":"1","attributes":{"name":null,"parent-id":null}}]}"#,
        )
        .unwrap();
        let folders = folders.into_folders();
        assert_eq!(folders[0].name, "");
        assert_eq!(folders[0].parent_id, None);

        let projects: ProjectsDocument = serde_json::from_str(
            r#"{"data":[{"type":"projects","id":"9","attributes":{"name":null}}]}"#,
        )
        .unwrap();
        assert_eq!(projects.into_projects()[0].name, "");
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        assert!(serde_json::from_str::<FoldersDocument>(r#"{"data":{"id":"1"}}"#).is_err());
        assert!(serde_json::from_str::<ScenariosDocument>("<html>").is_err());
    }
}
