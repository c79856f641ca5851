//! Watch facility backed by the `notify` crate.

use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::Context;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::config::WatchConfig;
use crate::core::{WatchEvent, WatchFacility};
use crate::error::BoxError;

/// Watches stash sources on the host and forwards their events as [`WatchEvent`]s.
///
/// Events arrive on the receiver returned by [`NotifyWatchFacility::new`]; the owner of the
/// stash pumps them with `StashService::drain_events`.
pub struct NotifyWatchFacility {
    watcher: Box<dyn Watcher + Send>,
}

impl NotifyWatchFacility {
    /// Creates the platform watcher, or a polling one if `config.poll_interval_ms` is set.
    pub fn new(config: &WatchConfig) -> anyhow::Result<(Self, Receiver<WatchEvent>)> {
        let (tx, rx) = mpsc::channel();
        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in convert_event(event) {
                    if tx.send(change).is_err() {
                        debug!("watch event dropped: receiver disconnected");
                    }
                }
            }
            Err(e) => warn!(error = %e, "watch error"),
        };

        let watcher: Box<dyn Watcher + Send> = match config.poll_interval_ms {
            Some(ms) => {
                let poll_config =
                    notify::Config::default().with_poll_interval(Duration::from_millis(ms));
                Box::new(PollWatcher::new(handler, poll_config).context("failed to create poll watcher")?)
            }
            None => Box::new(notify::recommended_watcher(handler).context("failed to create watcher")?),
        };

        Ok((Self { watcher }, rx))
    }
}

impl WatchFacility for NotifyWatchFacility {
    fn watch(&mut self, path: &Path) -> Result<(), BoxError> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<(), BoxError> {
        self.watcher.unwatch(path)?;
        Ok(())
    }
}

/// Maps a raw notify event onto stash watch events. A rename reads as the old path being
/// deleted and the new one created.
pub(crate) fn convert_event(event: Event) -> Vec<WatchEvent> {
    let paths = event.paths.into_iter();
    match event.kind {
        EventKind::Create(_) => paths.map(WatchEvent::Created).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.map(WatchEvent::Deleted).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.map(WatchEvent::Created).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => paths
            .enumerate()
            .map(|(i, p)| if i == 0 { WatchEvent::Deleted(p) } else { WatchEvent::Created(p) })
            .collect(),
        EventKind::Modify(_) => paths.map(WatchEvent::Dirty).collect(),
        EventKind::Remove(_) => paths.map(WatchEvent::Deleted).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Instant;

    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};
    use tempdir::TempDir;

    use super::*;
    use crate::{CountingNotifier, NodeType, StashService};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, p| event.add_path(PathBuf::from(p)))
    }

    #[test]
    fn test_convert_basic_kinds() {
        assert_eq!(
            convert_event(event(EventKind::Create(CreateKind::File), &["/a"])),
            vec![WatchEvent::Created("/a".into())]
        );
        assert_eq!(
            convert_event(event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/a"]
            )),
            vec![WatchEvent::Dirty("/a".into())]
        );
        assert_eq!(
            convert_event(event(EventKind::Remove(RemoveKind::File), &["/a"])),
            vec![WatchEvent::Deleted("/a".into())]
        );
        assert!(convert_event(event(EventKind::Access(AccessKind::Any), &["/a"])).is_empty());
    }

    #[test]
    fn test_convert_renames() {
        assert_eq!(
            convert_event(event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["/old", "/new"]
            )),
            vec![
                WatchEvent::Deleted("/old".into()),
                WatchEvent::Created("/new".into())
            ]
        );
        assert_eq!(
            convert_event(event(
                EventKind::Modify(ModifyKind::Name(RenameMode::From)),
                &["/old"]
            )),
            vec![WatchEvent::Deleted("/old".into())]
        );
    }

    #[test]
    fn test_poll_facility_watches_existing_file() -> anyhow::Result<()> {
        let tmp = TempDir::new("vfs_stash")?;
        let file = tmp.path().join("a.txt");
        std::fs::write(&file, b"hello")?;

        let config = WatchConfig {
            poll_interval_ms: Some(50),
        };
        let (mut facility, _events) = NotifyWatchFacility::new(&config)?;
        facility.watch(&file).map_err(|e| anyhow::anyhow!(e))?;
        facility.unwatch(&file).map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    }

    #[test]
    fn test_deleted_source_leaves_stash() -> anyhow::Result<()> {
        let tmp = TempDir::new("vfs_stash")?;
        let file = tmp.path().join("song.mp3");
        let keep = tmp.path().join("keep.mp3");
        std::fs::write(&file, b"la la la")?;
        std::fs::write(&keep, b"do re mi")?;

        let config = WatchConfig {
            poll_interval_ms: Some(20),
        };
        let (facility, events) = NotifyWatchFacility::new(&config)?;
        let notifier = CountingNotifier::new();
        let mut stash = StashService::new(facility, notifier.clone());
        stash.add_path(&file.to_string_lossy(), "/music/song.mp3", NodeType::File)?;
        stash.add_path(&keep.to_string_lossy(), "/music/keep.mp3", NodeType::File)?;
        let before = notifier.count();

        std::fs::remove_file(&file)?;

        let deadline = Instant::now() + Duration::from_secs(10);
        while stash.find("/music/song.mp3").is_valid() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
            stash.drain_events(&events);
        }

        assert!(!stash.find("/music/song.mp3").is_valid());
        assert!(!stash.is_watched(&file));
        assert!(stash.find("/music/keep.mp3").is_file());
        assert!(stash.is_watched(&keep));
        assert_eq!(notifier.count() - before, 1);
        Ok(())
    }
}
