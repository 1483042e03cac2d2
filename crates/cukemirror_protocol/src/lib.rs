//! Shared model for the cukemirror workspace.
//!
//! Everything the store, the upstream adapter and the refresh orchestrator
//! agree on lives here:
//!
//! - entity shapes ([`Folder`], [`Scenario`], [`Tag`], [`Project`]) and the
//!   [`Scope`] that partitions mirrored data
//! - the tag-filter predicate used by scenario queries ([`tags`])
//! - flat-to-tree folder reconstruction ([`hierarchy`])
//! - home directory and default file locations ([`paths`])

pub mod hierarchy;
pub mod paths;
pub mod tags;
pub mod types;

pub use hierarchy::{build_hierarchy, FolderForest};
pub use tags::{matches_all_tags, parse_tag_filters, TagFilter};
pub use types::{
    Folder, FolderNode, MirrorKind, Project, Scenario, Scope, StudioCredentials, Tag, UserAccount,
};
