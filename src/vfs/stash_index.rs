//! This module provides the stash index: an in-memory tree of stash nodes addressed by
//! virtual path.

use std::path::Path;

use tracing::debug;

use crate::core::{Result, utils};
use crate::error::StashError;
use crate::{ListEntry, NodeType, StashNode};

/// The tree of stash nodes, rooted at the virtual root `/`.
///
/// `StashIndex` maps virtual paths either to real source paths (files and symlinks) or to
/// purely structural directories. It never touches the host filesystem.
///
/// ### Internal state
///
/// * `root`: the virtual root directory. Every other node is owned, directly or transitively,
///   by its `children` map. Children are keyed by a single path segment and kept in insertion
///   order.
///
/// ### Invariants
///
/// 1. **Root existence**: the root is always present and has type `Directory`.
/// 2. **Uniqueness**: inside one directory each child name maps to exactly one node. Adding an
///    occupied path is rejected, never overwritten.
/// 3. **Type consistency**: `File` and `Symlink` nodes have a source and no children;
///    `Directory` nodes have no source.
/// 4. **No `Invalid` nodes**: `Invalid` is only ever produced by lookups.
///
/// ### Lifecycle
///
/// Nodes are created by `add_folder()`, `add_file()` and `add_symlink()` and destroyed by
/// `del_entry()`, which also drops the whole subtree of a directory.
///
/// ### Thread Safety
///
/// The index has no internal locking. It is meant to be owned by a single event loop; queries
/// return owned snapshots, so no caller ever holds a reference into the tree across a mutation.
///
/// ### Example
///
/// ```
/// use vfs_stash::{NodeType, StashIndex};
///
/// let mut index = StashIndex::new();
/// index.add_folder("/music").unwrap();
/// index.add_file("/home/user/song.mp3", "/music/song.mp3").unwrap();
///
/// assert_eq!(index.find_node("/music/song.mp3").node_type(), NodeType::File);
/// assert_eq!(index.list_children("/music").len(), 1);
///
/// index.del_entry("/music");
/// assert_eq!(index.find_node("/music/song.mp3").node_type(), NodeType::Invalid);
/// ```
#[derive(Debug, Clone)]
pub struct StashIndex {
    root: StashNode,
}

impl StashIndex {
    /// Creates an index holding only the root directory.
    pub fn new() -> Self {
        Self {
            root: StashNode::directory(),
        }
    }

    fn node(&self, path: &str) -> Option<&StashNode> {
        let path = utils::normalize(path).ok()?;
        let mut current = &self.root;
        for segment in utils::segments(&path) {
            current = current.children().get(segment)?;
        }
        Some(current)
    }

    /// Returns a snapshot of the node at `path`, or an `Invalid` node if there is none.
    pub fn find_node(&self, path: &str) -> StashNode {
        self.node(path).cloned().unwrap_or_else(StashNode::invalid)
    }

    /// Checks if a node exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.node(path).is_some()
    }

    /// Number of nodes, not counting the root.
    pub fn len(&self) -> usize {
        fn count(node: &StashNode) -> usize {
            node.children().values().map(|child| 1 + count(child)).sum()
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.children().is_empty()
    }

    /// Creates a structural directory and all its missing parents.
    ///
    /// Returns `true` if a directory was created, `false` if one already existed at `path`.
    /// Fails with `AlreadyExists` if `path` or one of its parents is a file or symlink.
    pub fn add_folder(&mut self, path: &str) -> Result<bool> {
        let path = utils::normalize(path)?;

        let mut created = false;
        let mut walked = String::new();
        let mut current = &mut self.root;
        for segment in utils::segments(&path) {
            walked.push(utils::SEPARATOR);
            walked.push_str(segment);
            created |= !current.children().contains_key(segment);
            let child = current
                .children_mut()
                .entry(segment.to_string())
                .or_insert_with(StashNode::directory);
            if !child.is_dir() {
                return Err(StashError::AlreadyExists { path: walked });
            }
            current = child;
        }

        if created {
            debug!(path = %path, "stash folder added");
        }
        Ok(created)
    }

    /// Creates a `File` node at `path` backed by `source`.
    /// Missing parent directories are created.
    pub fn add_file<P: AsRef<Path>>(&mut self, source: P, path: &str) -> Result<()> {
        self.add_leaf(NodeType::File, source.as_ref(), path)
    }

    /// Creates a `Symlink` node at `path` backed by `source`.
    /// Missing parent directories are created.
    pub fn add_symlink<P: AsRef<Path>>(&mut self, source: P, path: &str) -> Result<()> {
        self.add_leaf(NodeType::Symlink, source.as_ref(), path)
    }

    /// Validates that a file or symlink could be added at `path` right now.
    ///
    /// Fails with `AlreadyExists` if `path` is occupied (the root always is) or if one of its
    /// existing parents is not a directory.
    pub fn check_vacant(&self, path: &str) -> Result<()> {
        let path = utils::normalize(path)?;
        let segments = utils::segments(&path);
        if segments.is_empty() {
            return Err(StashError::AlreadyExists {
                path: utils::SEPARATOR.to_string(),
            });
        }

        let mut walked = String::new();
        let mut current = &self.root;
        for (i, segment) in segments.iter().enumerate() {
            walked.push(utils::SEPARATOR);
            walked.push_str(segment);
            let Some(child) = current.children().get(*segment) else {
                return Ok(());
            };
            if i + 1 == segments.len() || !child.is_dir() {
                return Err(StashError::AlreadyExists { path: walked });
            }
            current = child;
        }
        Ok(())
    }

    fn add_leaf(&mut self, node_type: NodeType, source: &Path, path: &str) -> Result<()> {
        if source.as_os_str().is_empty() {
            return Err(StashError::EmptyPath);
        }
        self.check_vacant(path)?;

        let path = utils::normalize(path)?;
        let segments = utils::segments(&path);
        let Some((name, parents)) = segments.split_last() else {
            return Err(StashError::AlreadyExists { path: path.clone() });
        };

        let mut current = &mut self.root;
        for segment in parents {
            current = current
                .children_mut()
                .entry(segment.to_string())
                .or_insert_with(StashNode::directory);
        }
        current
            .children_mut()
            .insert(name.to_string(), StashNode::with_source(node_type, source));

        debug!(path = %path, source = %source.display(), ?node_type, "stash entry added");
        Ok(())
    }

    /// Removes the node at `path` together with its subtree.
    ///
    /// Returns the removed node, or `None` if nothing was there. The root cannot be removed.
    pub fn del_entry(&mut self, path: &str) -> Option<StashNode> {
        let path = utils::normalize(path).ok()?;
        let segments = utils::segments(&path);
        let (name, parents) = segments.split_last()?;

        let mut current = &mut self.root;
        for segment in parents {
            current = current.children_mut().get_mut(*segment)?;
        }
        let removed = current.children_mut().shift_remove(*name)?;

        debug!(path = %path, node_type = ?removed.node_type(), "stash entry removed");
        Some(removed)
    }

    /// Lists the immediate children of the directory at `path`, in insertion order.
    ///
    /// Entries carry the child name, not the full virtual path. Non-directories and missing
    /// paths list as empty.
    pub fn list_children(&self, path: &str) -> Vec<ListEntry> {
        match self.node(path) {
            Some(node) if node.is_dir() => node
                .children()
                .iter()
                .map(|(name, child)| {
                    ListEntry::new(
                        name.clone(),
                        child.source().map(Path::to_path_buf),
                        child.node_type(),
                    )
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every node backed by a source, depth-first, with its full virtual path.
    pub fn sources(&self) -> Vec<ListEntry> {
        let mut out = Vec::new();
        collect_sources(&self.root, "/", &mut out);
        out
    }

    /// Virtual paths of every node whose source is `source`.
    pub fn find_by_source<P: AsRef<Path>>(&self, source: P) -> Vec<String> {
        let source = source.as_ref();
        self.sources()
            .into_iter()
            .filter(|entry| entry.source() == Some(source))
            .map(|entry| entry.virtual_path().to_string())
            .collect()
    }
}

impl Default for StashIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects `node` (if it has a source) and every sourced descendant. `path` is the virtual
/// path of `node` itself.
pub(crate) fn collect_sources(node: &StashNode, path: &str, out: &mut Vec<ListEntry>) {
    if let Some(source) = node.source() {
        out.push(ListEntry::new(path, Some(source.to_path_buf()), node.node_type()));
    }
    for (name, child) in node.children() {
        collect_sources(child, &utils::join(path, name), out);
    }
}
