//! Platform-specific event handling

use crate::event::{FsEvent, RawNotifyEvent};
use crate::Result;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod passthrough;

#[cfg(target_os = "linux")]
pub use linux::LinuxHandler as PlatformHandler;
#[cfg(not(target_os = "linux"))]
pub use passthrough::PassthroughHandler as PlatformHandler;

/// Converts raw backend events into normalized events
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
	/// Handle one raw event, returning whatever can be emitted immediately
	async fn process(&self, event: RawNotifyEvent) -> Result<Vec<FsEvent>>;

	/// Flush buffered state that has aged out
	async fn tick(&self) -> Result<Vec<FsEvent>>;

	/// Drop all buffered state
	async fn reset(&self);
}
