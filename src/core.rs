use std::path::{Path, PathBuf};

use crate::error::{BoxError, StashError};

pub type Result<T> = std::result::Result<T, StashError>;

/// Event emitted by a watch facility for a registered real path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchEvent {
    Created(PathBuf),
    /// Content changed; the path itself still exists.
    Dirty(PathBuf),
    Deleted(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(p) | WatchEvent::Dirty(p) | WatchEvent::Deleted(p) => p,
        }
    }
}

/// External service observing real paths.
///
/// Both calls are synchronous: they either succeed or fail before returning.
pub trait WatchFacility {
    fn watch(&mut self, path: &Path) -> std::result::Result<(), BoxError>;
    fn unwatch(&mut self, path: &Path) -> std::result::Result<(), BoxError>;
}

/// Receiver of the payload-less "stash tree changed" signal.
pub trait ChangeNotifier {
    fn list_changed(&self);
}

pub mod utils {
    use super::Result;
    use crate::error::StashError;

    pub const SEPARATOR: char = '/';

    /// Canonicalizes a raw path: trims surrounding whitespace and control
    /// characters, then drops exactly one trailing separator.
    ///
    /// A lone separator stays `/` (the virtual root). Normalizing an output again returns it
    /// unchanged unless it still ends with a separator or with whitespace left in front of the
    /// stripped one (`"a//"` gives `"a/"`, `"a /"` gives `"a "`).
    pub fn normalize(raw: &str) -> Result<String> {
        let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c.is_control());
        if trimmed.is_empty() {
            return Err(StashError::EmptyPath);
        }
        if trimmed.len() == 1 && trimmed.ends_with(SEPARATOR) {
            return Ok(trimmed.to_string());
        }
        Ok(trimmed.strip_suffix(SEPARATOR).unwrap_or(trimmed).to_string())
    }

    /// Splits a virtual path into its non-empty segments.
    pub fn segments(path: &str) -> Vec<&str> {
        path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
    }

    pub fn is_virtual_root(path: &str) -> bool {
        segments(path).is_empty()
    }

    /// Joins a virtual directory and a child name into an absolute virtual path.
    pub fn join(dir: &str, name: &str) -> String {
        let mut parts = segments(dir);
        parts.extend(segments(name));
        format!("{}{}", SEPARATOR, parts.join("/"))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_normalize_trailing_separator() {
            assert_eq!(normalize("a/b/").unwrap(), "a/b");
            assert_eq!(normalize("a/").unwrap(), "a");
            assert_eq!(normalize("a").unwrap(), "a");
            assert_eq!(normalize("/music/").unwrap(), "/music");
        }

        #[test]
        fn test_normalize_strips_only_one_separator() {
            assert_eq!(normalize("a//").unwrap(), "a/");
        }

        #[test]
        fn test_normalize_trims_whitespace_and_control() {
            assert_eq!(normalize("  /home/user/file.txt\n").unwrap(), "/home/user/file.txt");
            assert_eq!(normalize("\t/a/b/\r\n").unwrap(), "/a/b");
            assert_eq!(normalize("\u{0}/a\u{7}").unwrap(), "/a");
        }

        #[test]
        fn test_normalize_keeps_inner_whitespace() {
            assert_eq!(normalize(" /my docs/a b.txt ").unwrap(), "/my docs/a b.txt");
        }

        #[test]
        fn test_normalize_idempotent() {
            for path in ["a/b", "/", "/music/song.mp3", "x"] {
                let once = normalize(path).unwrap();
                assert_eq!(once, path);
                assert_eq!(normalize(&once).unwrap(), once);
            }
        }

        #[test]
        fn test_normalize_twice_strips_again() {
            let once = normalize("a//").unwrap();
            assert_eq!(once, "a/");
            assert_eq!(normalize(&once).unwrap(), "a");

            let once = normalize("a /").unwrap();
            assert_eq!(once, "a ");
            assert_eq!(normalize(&once).unwrap(), "a");
        }

        #[test]
        fn test_normalize_root() {
            assert_eq!(normalize("/").unwrap(), "/");
            assert_eq!(normalize(" / ").unwrap(), "/");
        }

        #[test]
        fn test_normalize_empty() {
            assert!(matches!(normalize(""), Err(StashError::EmptyPath)));
            assert!(matches!(normalize("  \n\t"), Err(StashError::EmptyPath)));
        }

        #[test]
        fn test_segments() {
            assert_eq!(segments("/a/b/c"), vec!["a", "b", "c"]);
            assert_eq!(segments("a//b/"), vec!["a", "b"]);
            assert!(segments("/").is_empty());
            assert!(is_virtual_root("/"));
            assert!(!is_virtual_root("/a"));
        }

        #[test]
        fn test_join() {
            assert_eq!(join("/music", "song.mp3"), "/music/song.mp3");
            assert_eq!(join("/", "song.mp3"), "/song.mp3");
            assert_eq!(join("music/", "/song.mp3"), "/music/song.mp3");
        }
    }
}
