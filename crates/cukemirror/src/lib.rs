//! cukemirror: keeps a local, queryable mirror of Cucumber Studio folders and
//! scenarios per `(project, user)` scope.
//!
//! [`Refresher`] pulls upstream state into the [`MirrorDb`]; the [`service`]
//! functions answer hierarchy and scenario queries from the mirror.

pub mod config;
pub mod error;
pub mod locks;
pub mod refresh;
pub mod service;

pub use cukemirror_db::{MirrorDb, ReplaceReport, ReplaceStrategy, ScenarioQuery};
pub use error::{Result, SyncError};
pub use locks::ScopeLocks;
pub use refresh::{RefreshPhase, Refresher};
