//! The stash service: the single owner of the index, keeping it in lockstep with the watch
//! facility and announcing every change to the listing consumer.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use tracing::{debug, info, warn};

use crate::core::{ChangeNotifier, Result, WatchEvent, WatchFacility, utils};
use crate::error::StashError;
use crate::vfs::collect_sources;
use crate::{ListEntry, NodeType, StashIndex, StashNode};

/// Hosts a [`StashIndex`] and reconciles it with an external watch facility.
///
/// Every `File`/`Symlink` source in the index has exactly one active registration on the
/// facility, however many nodes share it. Adds are atomic: if the facility refuses the source,
/// the index is left untouched.
///
/// All calls are expected to come from one event loop. There is no internal locking.
///
/// ### Example
///
/// ```
/// use std::path::Path;
/// use vfs_stash::{BoxError, CountingNotifier, NodeType, StashService, WatchEvent, WatchFacility};
///
/// struct NullWatch;
///
/// impl WatchFacility for NullWatch {
///     fn watch(&mut self, _: &Path) -> Result<(), BoxError> { Ok(()) }
///     fn unwatch(&mut self, _: &Path) -> Result<(), BoxError> { Ok(()) }
/// }
///
/// let notifier = CountingNotifier::new();
/// let mut stash = StashService::new(NullWatch, notifier.clone());
/// stash.add_path("", "/music", NodeType::Directory).unwrap();
/// stash.add_path("/home/user/song.mp3", "/music/song.mp3", NodeType::File).unwrap();
///
/// stash.handle_event(WatchEvent::Deleted("/home/user/song.mp3".into()));
/// assert!(!stash.find("/music/song.mp3").is_valid());
/// assert_eq!(notifier.count(), 3);
/// ```
pub struct StashService<W: WatchFacility, N: ChangeNotifier> {
    index: StashIndex,
    watcher: W,
    notifier: N,
    watched: HashMap<PathBuf, usize>, // source -> number of nodes backed by it
}

impl<W: WatchFacility, N: ChangeNotifier> StashService<W, N> {
    pub fn new(watcher: W, notifier: N) -> Self {
        info!("stash service started");
        Self {
            index: StashIndex::new(),
            watcher,
            notifier,
            watched: HashMap::new(),
        }
    }

    pub fn index(&self) -> &StashIndex {
        &self.index
    }

    pub fn watcher(&self) -> &W {
        &self.watcher
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Checks if `source` currently holds a watch registration.
    pub fn is_watched<P: AsRef<Path>>(&self, source: P) -> bool {
        self.watched.contains_key(source.as_ref())
    }

    /// Snapshot of the node at `virtual_path`; `Invalid` if there is none.
    pub fn find(&self, virtual_path: &str) -> StashNode {
        self.index.find_node(virtual_path)
    }

    /// Immediate children of `virtual_path`, in insertion order.
    pub fn list(&self, virtual_path: &str) -> Vec<ListEntry> {
        self.index.list_children(virtual_path)
    }

    /// Adds `virtual_path` to the stash.
    ///
    /// Directories are structural: `source` is ignored and nothing is watched. Adding a
    /// directory that is already there succeeds without a change signal.
    /// Files and symlinks are backed by `source`, which gets registered with the watch
    /// facility. On any error the index and the watch registrations are left as they were.
    pub fn add_path(&mut self, source: &str, virtual_path: &str, node_type: NodeType) -> Result<()> {
        let virtual_path = utils::normalize(virtual_path)?;

        match node_type {
            NodeType::Directory => {
                if !self.index.add_folder(&virtual_path)? {
                    debug!(path = %virtual_path, "folder already in stash");
                    return Ok(());
                }
            }
            NodeType::File | NodeType::Symlink => {
                let source = PathBuf::from(utils::normalize(source)?);
                self.index.check_vacant(&virtual_path)?;
                self.acquire_watch(&source)?;

                let added = if node_type == NodeType::File {
                    self.index.add_file(&source, &virtual_path)
                } else {
                    self.index.add_symlink(&source, &virtual_path)
                };
                if let Err(e) = added {
                    self.release_watch(&source);
                    return Err(e);
                }
            }
            NodeType::Invalid => return Err(StashError::UnsupportedNodeType(node_type)),
        }

        info!(path = %virtual_path, ?node_type, "added to stash");
        self.notifier.list_changed();
        Ok(())
    }

    /// Same as [`add_path`](Self::add_path), with the node type given as its wire code.
    pub fn add_wire(&mut self, source: &str, virtual_path: &str, code: i64) -> Result<()> {
        let node_type = NodeType::try_from(code)?;
        self.add_path(source, virtual_path, node_type)
    }

    /// Stashes the real path `source` under the virtual directory `virtual_dir`, keeping its
    /// file name. The node type follows what `source` is on the host (links are not followed).
    ///
    /// Returns the virtual path of the new node.
    pub fn stash_path(&mut self, source: &str, virtual_dir: &str) -> Result<String> {
        let source = utils::normalize(source)?;
        let virtual_dir = utils::normalize(virtual_dir)?;
        let real = Path::new(&source);
        let unsupported = || StashError::UnsupportedSource {
            path: real.to_path_buf(),
        };

        let name = real
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(unsupported)?;
        let file_type = std::fs::symlink_metadata(real)
            .map_err(|_| unsupported())?
            .file_type();
        let node_type = if file_type.is_symlink() {
            NodeType::Symlink
        } else if file_type.is_dir() {
            NodeType::Directory
        } else if file_type.is_file() {
            NodeType::File
        } else {
            return Err(unsupported());
        };

        let target = utils::join(&virtual_dir, name);
        self.add_path(&source, &target, node_type)?;
        Ok(target)
    }

    /// Removes `path` from the stash. Idempotent.
    ///
    /// Every node backed by the real path `path` is removed; if `path` is also a virtual path
    /// in the stash, that node (and its subtree) goes too. Returns the number of nodes removed
    /// at top level.
    pub fn remove_path(&mut self, path: &str) -> Result<usize> {
        let path = utils::normalize(path)?;
        Ok(self.reconcile_removal(&path, true))
    }

    /// Reacts to a watch facility callback.
    ///
    /// Only deletions change the stash: nodes backed by the deleted path go, and so does a
    /// structural directory at that virtual path. A file or symlink that merely sits at that
    /// virtual path is backed by another source and stays. Creation and modification are observed: the stash is an
    /// explicit allow-list, not a mirror of the host.
    pub fn handle_event(&mut self, event: WatchEvent) {
        match &event {
            WatchEvent::Created(path) => info!(path = %path.display(), "created"),
            WatchEvent::Dirty(path) => info!(path = %path.display(), "something has changed"),
            WatchEvent::Deleted(path) => {
                let Ok(path) = utils::normalize(&path.to_string_lossy()) else {
                    warn!("deletion event with empty path ignored");
                    return;
                };
                let removed = self.reconcile_removal(&path, false);
                debug!(path = %path, removed, "deletion reconciled");
            }
        }
    }

    /// Handles every event already queued on `events` without blocking.
    /// Returns the number of events handled.
    pub fn drain_events(&mut self, events: &Receiver<WatchEvent>) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Removes every node sourced from `path`, plus the node at virtual path `path`: any kind
    /// when `any_kind`, otherwise only a directory.
    fn reconcile_removal(&mut self, path: &str, any_kind: bool) -> usize {
        let mut targets = self.index.find_by_source(path);
        if !utils::is_virtual_root(path) {
            let node = self.index.find_node(path);
            if node.is_valid() && (any_kind || node.is_dir()) {
                targets.push(path.to_string());
            }
        }

        let mut removed = 0;
        for target in targets {
            // A previous target may have been an ancestor of this one.
            let Some(node) = self.index.del_entry(&target) else {
                continue;
            };
            let mut sourced = Vec::new();
            collect_sources(&node, &target, &mut sourced);
            for entry in &sourced {
                if let Some(source) = entry.source() {
                    self.release_watch(source);
                }
            }
            removed += 1;
        }

        if removed > 0 {
            info!(path = %path, removed, "removed from stash");
            self.notifier.list_changed();
        }
        removed
    }

    fn acquire_watch(&mut self, source: &Path) -> Result<()> {
        if let Some(count) = self.watched.get_mut(source) {
            *count += 1;
            return Ok(());
        }
        self.watcher
            .watch(source)
            .map_err(|e| StashError::WatchRegistration {
                path: source.to_path_buf(),
                source: e,
            })?;
        debug!(source = %source.display(), "watch registered");
        self.watched.insert(source.to_path_buf(), 1);
        Ok(())
    }

    fn release_watch(&mut self, source: &Path) {
        let Some(count) = self.watched.get_mut(source) else {
            return;
        };
        *count -= 1;
        if *count > 0 {
            return;
        }
        self.watched.remove(source);
        match self.watcher.unwatch(source) {
            Ok(()) => debug!(source = %source.display(), "watch removed"),
            Err(e) => warn!(source = %source.display(), error = %e, "failed to remove watch"),
        }
    }
}
