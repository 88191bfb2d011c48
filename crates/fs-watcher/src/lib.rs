//! Filesystem watcher that turns raw `notify` events into normalized [`FsEvent`]s.
//!
//! Raw events pass through a platform [`EventHandler`] that pairs rename halves and
//! buffers modify bursts before they are broadcast to subscribers.

mod error;
mod event;
mod platform;
mod watcher;

pub use error::{FsWatcherError, Result};
pub use event::{FsEvent, FsEventKind, RawEventKind, RawNotifyEvent};
pub use platform::{EventHandler, PlatformHandler};
pub use watcher::{FsWatcher, WatcherConfig};
