//! Linux-specific event handler
//!
//! inotify reports a rename as two events sharing a cookie. When only one half
//! arrives the item moved across the edge of the watched tree, so an orphaned
//! `From` becomes a removal and an orphaned `To` becomes a creation.

use crate::event::{FsEvent, RawEventKind, RawNotifyEvent};
use crate::platform::EventHandler;
use crate::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::trace;

/// Timeout for modify stabilization and rename pairing
const STABILIZATION_TIMEOUT_MS: u64 = 100;

pub struct LinuxHandler {
	/// Files pending stabilization
	pending_updates: RwLock<HashMap<PathBuf, Instant>>,
	/// Rename sources waiting for their destination, keyed by inotify cookie
	pending_renames: RwLock<HashMap<usize, (PathBuf, Instant)>>,
}

impl LinuxHandler {
	pub fn new() -> Self {
		Self {
			pending_updates: RwLock::new(HashMap::new()),
			pending_renames: RwLock::new(HashMap::new()),
		}
	}

	async fn evict_updates(&self, timeout: Duration) -> Vec<FsEvent> {
		let mut updates = self.pending_updates.write().await;
		let stable = updates
			.iter()
			.filter(|(_, timestamp)| timestamp.elapsed() > timeout)
			.map(|(path, _)| path.clone())
			.collect::<Vec<_>>();

		stable
			.into_iter()
			.map(|path| {
				updates.remove(&path);
				trace!("Evicting update (stabilized): {}", path.display());
				FsEvent::modify(path)
			})
			.collect()
	}

	/// Rename sources that never saw a destination left the watched tree
	async fn evict_renames(&self, timeout: Duration) -> Vec<FsEvent> {
		let mut renames = self.pending_renames.write().await;
		let expired = renames
			.iter()
			.filter(|(_, (_, timestamp))| timestamp.elapsed() > timeout)
			.map(|(cookie, _)| *cookie)
			.collect::<Vec<_>>();

		expired
			.into_iter()
			.filter_map(|cookie| renames.remove(&cookie))
			.map(|(path, _)| {
				trace!("Rename source moved out of watch: {}", path.display());
				FsEvent::remove(path)
			})
			.collect()
	}
}

impl Default for LinuxHandler {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait::async_trait]
impl EventHandler for LinuxHandler {
	async fn process(&self, event: RawNotifyEvent) -> Result<Vec<FsEvent>> {
		let Some(path) = event.primary_path().cloned() else {
			return Ok(vec![]);
		};

		match event.kind {
			RawEventKind::Create => Ok(vec![FsEvent::create(path)]),
			RawEventKind::Remove => {
				self.pending_updates.write().await.remove(&path);
				Ok(vec![FsEvent::remove(path)])
			}
			RawEventKind::Modify => {
				self.pending_updates
					.write()
					.await
					.insert(path, Instant::now());
				Ok(vec![])
			}
			RawEventKind::Rename if event.paths.len() >= 2 => {
				Ok(vec![FsEvent::rename(path, event.paths[1].clone())])
			}
			RawEventKind::RenameFrom => match event.tracker {
				Some(cookie) => {
					self.pending_renames
						.write()
						.await
						.insert(cookie, (path, Instant::now()));
					Ok(vec![])
				}
				None => Ok(vec![FsEvent::remove(path)]),
			},
			RawEventKind::RenameTo => {
				let from = match event.tracker {
					Some(cookie) => self.pending_renames.write().await.remove(&cookie),
					None => None,
				};

				Ok(vec![match from {
					Some((from, _)) => FsEvent::rename(from, path),
					None => FsEvent::create(path),
				}])
			}
			RawEventKind::Rename => {
				trace!("Incomplete rename for {}, treating as modify", path.display());
				self.pending_updates
					.write()
					.await
					.insert(path, Instant::now());
				Ok(vec![])
			}
			RawEventKind::Other(ref kind) => {
				trace!("Ignoring unknown event kind: {}", kind);
				Ok(vec![])
			}
		}
	}

	async fn tick(&self) -> Result<Vec<FsEvent>> {
		let timeout = Duration::from_millis(STABILIZATION_TIMEOUT_MS);
		let mut events = self.evict_renames(timeout).await;
		events.extend(self.evict_updates(timeout).await);
		Ok(events)
	}

	async fn reset(&self) {
		self.pending_updates.write().await.clear();
		self.pending_renames.write().await.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::SystemTime;

	fn raw(kind: RawEventKind, paths: &[&str], tracker: Option<usize>) -> RawNotifyEvent {
		RawNotifyEvent {
			kind,
			paths: paths.iter().map(PathBuf::from).collect(),
			tracker,
			timestamp: SystemTime::now(),
		}
	}

	#[tokio::test]
	async fn test_remove_event() {
		let handler = LinuxHandler::new();
		let events = handler
			.process(raw(RawEventKind::Remove, &["/home/Docs"], None))
			.await
			.unwrap();
		assert_eq!(events.len(), 1);
		assert!(events[0].kind.is_remove());
	}

	#[tokio::test]
	async fn test_rename_halves_are_paired_by_cookie() {
		let handler = LinuxHandler::new();
		let first = handler
			.process(raw(RawEventKind::RenameFrom, &["/home/old"], Some(3)))
			.await
			.unwrap();
		assert!(first.is_empty());

		let second = handler
			.process(raw(RawEventKind::RenameTo, &["/home/new"], Some(3)))
			.await
			.unwrap();
		assert_eq!(second.len(), 1);
		assert_eq!(
			second[0].kind,
			crate::FsEventKind::Rename {
				from: PathBuf::from("/home/old")
			}
		);
		assert_eq!(second[0].path, PathBuf::from("/home/new"));
	}

	#[tokio::test]
	async fn test_orphaned_rename_source_becomes_remove() {
		let handler = LinuxHandler::new();
		handler
			.process(raw(RawEventKind::RenameFrom, &["/home/gone"], Some(9)))
			.await
			.unwrap();

		tokio::time::sleep(Duration::from_millis(STABILIZATION_TIMEOUT_MS + 50)).await;

		let events = handler.tick().await.unwrap();
		assert_eq!(events.len(), 1);
		assert!(events[0].kind.is_remove());
		assert_eq!(events[0].path, PathBuf::from("/home/gone"));
	}

	#[tokio::test]
	async fn test_modify_is_buffered_until_tick() {
		let handler = LinuxHandler::new();
		let events = handler
			.process(raw(RawEventKind::Modify, &["/home/file.txt"], None))
			.await
			.unwrap();
		assert!(events.is_empty());
		assert!(handler.tick().await.unwrap().is_empty());

		tokio::time::sleep(Duration::from_millis(STABILIZATION_TIMEOUT_MS + 50)).await;
		let events = handler.tick().await.unwrap();
		assert_eq!(events.len(), 1);
		assert!(events[0].kind.is_modify());
	}
}
