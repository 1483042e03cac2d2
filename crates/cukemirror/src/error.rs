//! Refresh and query errors.

use cukemirror_db::DbError;
use cukemirror_protocol::{MirrorKind, Scope};
use cukemirror_upstream::UpstreamError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Fetching from the upstream failed; the local mirror was not touched.
    #[error("Failed to fetch {what} from Cucumber Studio: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: UpstreamError,
    },

    /// A row of the new snapshot could not be inserted.
    #[error("Failed to create {kind} (ID: {id}), {persisted} new rows kept: {source}")]
    Insert {
        kind: MirrorKind,
        id: String,
        persisted: usize,
        #[source]
        source: DbError,
    },

    /// Scope replacement failed outside of a row insert (begin, delete, commit).
    #[error("Failed to replace {kind} for {scope}: {source}")]
    Replace {
        kind: MirrorKind,
        scope: Scope,
        #[source]
        source: DbError,
    },

    #[error("Store error: {0}")]
    Store(#[from] DbError),

    /// Projects exist upstream but no scenario could be refreshed for any of them.
    #[error("Failed to refresh scenarios for any project")]
    NoProjectRefreshed,

    #[error("Unknown user {0}")]
    UnknownUser(String),
}

impl SyncError {
    pub(crate) fn fetch(what: &'static str, source: UpstreamError) -> Self {
        Self::Fetch { what, source }
    }

    /// Classify a failed scope replacement.
    pub(crate) fn replace(kind: MirrorKind, scope: Scope, err: DbError) -> Self {
        let failed_row = match &err {
            DbError::InsertFailed { id, persisted, .. } => Some((id.clone(), *persisted)),
            _ => None,
        };
        if let Some((id, persisted)) = failed_row {
            return Self::Insert {
                kind,
                id,
                persisted,
                source: err,
            };
        }
        Self::Replace {
            kind,
            scope,
            source: err,
        }
    }

    /// True for failures that happened before the local mirror was touched.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
