use std::path::{Path, PathBuf};

use crate::NodeType;

/// One row of a directory listing, as forwarded to the listing consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    virtual_path: String,
    source: Option<PathBuf>,
    node_type: NodeType,
}

impl ListEntry {
    pub fn new(virtual_path: impl Into<String>, source: Option<PathBuf>, node_type: NodeType) -> ListEntry {
        ListEntry {
            virtual_path: virtual_path.into(),
            source,
            node_type,
        }
    }

    /// Name of the child inside the listed directory.
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn is_file(&self) -> bool {
        self.node_type == NodeType::File
    }

    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }
}
