//! Entity types mirrored from the upstream test-management service.
//!
//! These are the shapes handed to callers; the store and the upstream adapter
//! convert to and from them.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Scope
// ============================================================================

/// The `(project_id, user_id)` pair that partitions all mirrored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub project_id: i64,
    pub user_id: i64,
}

impl Scope {
    pub fn new(project_id: i64, user_id: i64) -> Self {
        Self {
            project_id,
            user_id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project={} user={}", self.project_id, self.user_id)
    }
}

/// Which mirrored table a refresh targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorKind {
    Folders,
    Scenarios,
}

impl MirrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folders => "folders",
            Self::Scenarios => "scenarios",
        }
    }
}

impl fmt::Display for MirrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Folders
// ============================================================================

/// A folder record as stored: flat, with a nullable parent pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    /// Parent folder id. Not guaranteed to resolve within the scope.
    pub parent_id: Option<String>,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: parent_id.map(str::to_string),
        }
    }
}

/// A folder inside a built hierarchy. Owns copies of its descendants.
///
/// Dropping and [`subtree_len`](Self::subtree_len) are iterative. The
/// derived `Debug`, `Clone`, `PartialEq` and serde impls recurse once per
/// level, so those are bounded by stack depth (a few thousand levels on a
/// 2 MiB thread).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    pub fn leaf(folder: &Folder) -> Self {
        Self {
            id: folder.id.clone(),
            name: folder.name.clone(),
            parent_id: folder.parent_id.clone(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

impl Drop for FolderNode {
    fn drop(&mut self) {
        // Detach descendants first so each node drops with no children left.
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

// ============================================================================
// Scenarios and tags
// ============================================================================

/// A key/value tag attached to a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A test scenario with its tags embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub folder_id: i64,
    pub project_id: i64,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

// ============================================================================
// Projects and users
// ============================================================================

/// An upstream project, simplified to id and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

impl Project {
    /// Numeric project id, if the upstream id is an integer.
    pub fn numeric_id(&self) -> Option<i64> {
        self.id.trim().parse().ok()
    }
}

/// Credentials sent to the upstream API on every request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioCredentials {
    /// Sent as the `uid` header.
    pub email: String,
    pub client_id: String,
    pub access_token: String,
}

impl fmt::Debug for StudioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudioCredentials")
            .field("email", &self.email)
            .field("client_id", &self.client_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// A local user: the scoping key for mirrored data and the owner of
/// upstream credentials plus the cached project list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub client_id: String,
    #[serde(default, skip_serializing)]
    pub access_token: String,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl UserAccount {
    pub fn credentials(&self) -> StudioCredentials {
        StudioCredentials {
            email: self.email.clone(),
            client_id: self.client_id.clone(),
            access_token: self.access_token.clone(),
        }
    }

    pub fn scope(&self, project_id: i64) -> Scope {
        Scope::new(project_id, self.id)
    }
}
