//! Flat-to-tree folder reconstruction.
//!
//! Folders arrive as flat `(id, name, parent_id)` records with no referential
//! integrity guarantee. The builder works in two passes over indices into the
//! borrowed input:
//!
//! 1. index ids and build a parent -> children adjacency list, promoting any
//!    folder whose parent id does not resolve (a dangling reference) to a root;
//! 2. walk from the roots, materialising owned [`FolderNode`] copies.
//!
//! Folders never reached from a root sit on (or below) a parent cycle. They are
//! reported in [`FolderForest::cyclic`] instead of disappearing.
//!
//! Roots and children keep input order.

use crate::types::{Folder, FolderNode};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Result of [`build_hierarchy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderForest {
    /// Top-level folders, each owning its descendants.
    pub roots: Vec<FolderNode>,
    /// Ids of folders whose parent did not resolve and were promoted to roots.
    pub dangling: Vec<String>,
    /// Ids of folders unreachable from any root (parent cycle), in input order.
    pub cyclic: Vec<String>,
}

impl FolderForest {
    /// True when every input folder was placed in the tree.
    pub fn is_complete(&self) -> bool {
        self.cyclic.is_empty()
    }

    /// Total number of nodes placed in the tree.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(FolderNode::subtree_len).sum()
    }

    pub fn into_roots(self) -> Vec<FolderNode> {
        self.roots
    }
}

/// Build a forest from flat folder records.
pub fn build_hierarchy(folders: &[Folder]) -> FolderForest {
    let count = folders.len();

    // Pass 1: id lookup. A repeated id resolves to its last occurrence.
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(count);
    for (idx, folder) in folders.iter().enumerate() {
        index.insert(folder.id.as_str(), idx);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut root_indices = Vec::new();
    let mut dangling = Vec::new();

    for (idx, folder) in folders.iter().enumerate() {
        let Some(parent_id) = folder.parent_id.as_deref() else {
            root_indices.push(idx);
            continue;
        };
        match index.get(parent_id) {
            Some(&parent_idx) => children[parent_idx].push(idx),
            None => {
                warn!(
                    folder_id = %folder.id,
                    parent_id = %parent_id,
                    "Folder has invalid parent ID, treating as root"
                );
                dangling.push(folder.id.clone());
                root_indices.push(idx);
            }
        }
    }

    // Pass 2: preorder walk from the roots. Parents precede children in
    // `order`, so building in reverse sees every child before its parent.
    let mut visited = vec![false; count];
    let mut order = Vec::with_capacity(count);
    let mut stack = Vec::new();
    for &root in &root_indices {
        stack.push(root);
        while let Some(idx) = stack.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            order.push(idx);
            stack.extend(children[idx].iter().rev().copied());
        }
    }

    let mut built: Vec<Option<FolderNode>> = vec![None; count];
    for &idx in order.iter().rev() {
        let mut node = FolderNode::leaf(&folders[idx]);
        node.children = children[idx]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[idx] = Some(node);
    }

    let roots: Vec<FolderNode> = root_indices
        .iter()
        .filter_map(|&idx| built[idx].take())
        .collect();

    let cyclic: Vec<String> = folders
        .iter()
        .zip(&visited)
        .filter(|(_, seen)| !**seen)
        .map(|(folder, _)| folder.id.clone())
        .collect();
    if !cyclic.is_empty() {
        warn!(
            count = cyclic.len(),
            folder_ids = ?cyclic,
            "Folders unreachable from any root (cyclic parent chain)"
        );
    }

    FolderForest {
        roots,
        dangling,
        cyclic,
    }
}
