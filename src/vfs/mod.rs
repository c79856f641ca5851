mod dir_entry;
mod entry;
mod stash_index;

pub use dir_entry::ListEntry;
pub use entry::{NodeType, StashNode};
pub use stash_index::StashIndex;

pub(crate) use stash_index::collect_sources;
