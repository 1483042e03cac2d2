//! Store-level types: replacement policy and scenario predicates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a scope snapshot is replaced during a refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStrategy {
    /// Delete and insert-all inside one transaction. Any failure rolls back
    /// and the previous snapshot stays visible.
    #[default]
    Atomic,
    /// Two-phase, non-transactional: a failed delete is logged and the insert
    /// phase runs anyway; the first failed insert aborts the rest and leaves
    /// whatever was already inserted in place.
    BestEffort,
}

impl ReplaceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atomic => "atomic",
            Self::BestEffort => "best_effort",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "atomic" => Some(Self::Atomic),
            "best_effort" => Some(Self::BestEffort),
            _ => None,
        }
    }
}

impl fmt::Display for ReplaceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful scope replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaceReport {
    pub strategy: ReplaceStrategy,
    /// Rows removed by the delete phase (0 when the delete failed).
    pub deleted: u64,
    pub inserted: usize,
    /// Best-effort only: the delete phase failed and was skipped over.
    pub delete_error: Option<String>,
}

/// Which scenarios of a scope to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioQuery {
    /// Every scenario in the scope.
    All,
    /// Scenarios in one folder.
    Folder(i64),
    /// Case-insensitive substring match on the name.
    Name(String),
    /// Conjunctive `"key:value"` tag filters. An empty list matches nothing.
    Tags(Vec<String>),
}

impl ScenarioQuery {
    /// Pick a predicate from optional request parameters.
    ///
    /// Precedence: tags (comma separated) > folder id > keyword > all. Empty
    /// strings count as absent.
    pub fn from_params(tags: Option<&str>, folder_id: Option<i64>, keyword: Option<&str>) -> Self {
        if let Some(tags) = tags.filter(|t| !t.is_empty()) {
            return Self::Tags(tags.split(',').map(str::to_string).collect());
        }
        if let Some(folder_id) = folder_id {
            return Self::Folder(folder_id);
        }
        if let Some(keyword) = keyword.filter(|k| !k.is_empty()) {
            return Self::Name(keyword.to_string());
        }
        Self::All
    }
}
