//! A virtual "stash" file system for Rust: one tree aggregating files, directories and
//! symlinks picked from anywhere on the host, kept in sync with the real paths it references.
//!
//! ### Overview
//!
//! `vfs-stash` indexes virtual paths against real source paths. Directories in the stash are
//! structural (they only hold children), files and symlinks point at a real path which is
//! watched on the host: when that path disappears, the stash forgets it.
//!
//! **Key ideas**:
//! - **Allow-list**: Nothing enters the stash unless it is added explicitly. Host events can only
//!   remove entries.
//! - **Reject, don't overwrite**: Adding an occupied virtual path is an error.
//! - **Snapshots**: Queries return owned values, never references into the live tree.
//! - **Injected collaborators**: The watch facility and the change notifier are traits, so the
//!   service runs the same against `notify` or an in-memory test double.

mod config;
mod core;
mod error;
mod logging;
mod sync;
mod vfs;

pub use config::{StashConfig, WatchConfig};
pub use crate::core::{ChangeNotifier, Result, WatchEvent, WatchFacility, utils};
pub use error::{BoxError, StashError};
pub use logging::{LoggingConfig, init_logging};
pub use sync::{
    ChangeSignal, ChannelNotifier, CountingNotifier, NotifyWatchFacility, StashService,
};
pub use vfs::{ListEntry, NodeType, StashIndex, StashNode};
