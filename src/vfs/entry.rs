use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::StashError;

/// Kind of a stash node.
///
/// The discriminants are the wire codes the listing consumer receives, so the
/// order must not change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    Directory = 0,
    Symlink = 1,
    File = 2,
    /// "No such node". Returned by lookups, never stored in the tree.
    Invalid = 3,
}

impl NodeType {
    /// Wire code of this node type.
    pub fn code(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for NodeType {
    type Error = StashError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(NodeType::Directory),
            1 => Ok(NodeType::Symlink),
            2 => Ok(NodeType::File),
            3 => Ok(NodeType::Invalid),
            other => Err(StashError::InvalidNodeType(other)),
        }
    }
}

/// A single entry of the stash tree.
///
/// Values handed out by the index are snapshots: mutating the index later
/// never changes a `StashNode` already returned to a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct StashNode {
    node_type: NodeType,
    source: Option<PathBuf>,
    children: IndexMap<String, StashNode>,
}

impl StashNode {
    pub(crate) fn directory() -> StashNode {
        StashNode {
            node_type: NodeType::Directory,
            source: None,
            children: IndexMap::new(),
        }
    }

    pub(crate) fn with_source<P: AsRef<Path>>(node_type: NodeType, source: P) -> StashNode {
        StashNode {
            node_type,
            source: Some(source.as_ref().to_path_buf()),
            children: IndexMap::new(),
        }
    }

    pub fn invalid() -> StashNode {
        StashNode {
            node_type: NodeType::Invalid,
            source: None,
            children: IndexMap::new(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Real path backing this node. `None` for structural directories.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Immediate children in insertion order, keyed by their name.
    pub fn children(&self) -> &IndexMap<String, StashNode> {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut IndexMap<String, StashNode> {
        &mut self.children
    }

    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.node_type == NodeType::File
    }

    pub fn is_symlink(&self) -> bool {
        self.node_type == NodeType::Symlink
    }

    pub fn is_valid(&self) -> bool {
        self.node_type != NodeType::Invalid
    }
}
