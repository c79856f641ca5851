mod notifier;
mod notify_watch;
mod service;

pub use notifier::{ChangeSignal, ChannelNotifier, CountingNotifier};
pub use notify_watch::NotifyWatchFacility;
pub use service::StashService;
