//! Error types for the stash.

use std::path::PathBuf;

use thiserror::Error;

/// Error raised by a watch facility when it cannot (un)register a path.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by stash operations.
///
/// Looking up or deleting a path that is not in the stash is not an error.
#[derive(Debug, Error)]
pub enum StashError {
    /// Path was empty after trimming.
    #[error("invalid path: empty")]
    EmptyPath,

    /// Virtual path is already occupied.
    #[error("path already exists: {path}")]
    AlreadyExists { path: String },

    /// The watch facility refused to register a source path.
    #[error("failed to watch {}: {source}", path.display())]
    WatchRegistration {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// A node type code received at the interface is out of range.
    #[error("invalid node type code: {0}")]
    InvalidNodeType(i64),

    /// The requested node type cannot be added (e.g. `Invalid`).
    #[error("node type {0:?} cannot be stashed")]
    UnsupportedNodeType(crate::NodeType),

    /// Source path is missing or is neither a file, directory nor symlink.
    #[error("unsupported source: {}", path.display())]
    UnsupportedSource { path: PathBuf },
}
