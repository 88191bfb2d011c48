use crate::event::{FsEvent, RawNotifyEvent};
use crate::platform::{EventHandler, PlatformHandler};
use crate::{FsWatcherError, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct WatcherConfig {
	/// How often buffered events are flushed
	pub tick_interval: Duration,
	/// Capacity of the broadcast channel handed to subscribers
	pub channel_capacity: usize,
}

impl Default for WatcherConfig {
	fn default() -> Self {
		Self {
			tick_interval: Duration::from_millis(50),
			channel_capacity: 1024,
		}
	}
}

struct Running {
	watcher: RecommendedWatcher,
	task: JoinHandle<()>,
}

/// Watches directory trees and broadcasts normalized events
pub struct FsWatcher {
	config: WatcherConfig,
	events: broadcast::Sender<FsEvent>,
	handler: Arc<PlatformHandler>,
	running: Mutex<Option<Running>>,
}

impl FsWatcher {
	pub fn new(config: WatcherConfig) -> Self {
		let (events, _) = broadcast::channel(config.channel_capacity);
		Self {
			config,
			events,
			handler: Arc::new(PlatformHandler::new()),
			running: Mutex::new(None),
		}
	}

	pub fn subscribe(&self) -> broadcast::Receiver<FsEvent> {
		self.events.subscribe()
	}

	pub async fn is_running(&self) -> bool {
		self.running.lock().await.is_some()
	}

	pub async fn start(&self) -> Result<()> {
		let mut running = self.running.lock().await;
		if running.is_some() {
			return Err(FsWatcherError::AlreadyRunning);
		}

		let (raw_tx, raw_rx) = mpsc::unbounded_channel::<RawNotifyEvent>();
		let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
			Ok(event) => {
				// Receiver is gone only while stopping
				let _ = raw_tx.send(event.into());
			}
			Err(e) => error!("Filesystem watcher backend error: {e:#}"),
		})?;

		let task = tokio::spawn(process_events(
			raw_rx,
			Arc::clone(&self.handler),
			self.events.clone(),
			self.config.tick_interval,
		));

		*running = Some(Running { watcher, task });
		info!("Filesystem watcher started");
		Ok(())
	}

	pub async fn watch(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let mut running = self.running.lock().await;
		let running = running.as_mut().ok_or(FsWatcherError::NotRunning)?;
		running.watcher.watch(path, RecursiveMode::Recursive)?;
		debug!("Watching {}", path.display());
		Ok(())
	}

	pub async fn unwatch(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let mut running = self.running.lock().await;
		let running = running.as_mut().ok_or(FsWatcherError::NotRunning)?;
		running.watcher.unwatch(path)?;
		debug!("Stopped watching {}", path.display());
		Ok(())
	}

	pub async fn stop(&self) {
		if let Some(Running { watcher, task }) = self.running.lock().await.take() {
			drop(watcher);
			task.abort();
			self.handler.reset().await;
			info!("Filesystem watcher stopped");
		}
	}
}

async fn process_events(
	mut raw_rx: mpsc::UnboundedReceiver<RawNotifyEvent>,
	handler: Arc<PlatformHandler>,
	events: broadcast::Sender<FsEvent>,
	tick_interval: Duration,
) {
	let mut ticker = tokio::time::interval(tick_interval);
	ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

	loop {
		let processed = tokio::select! {
			raw = raw_rx.recv() => match raw {
				Some(raw) => handler.process(raw).await,
				None => break,
			},
			_ = ticker.tick() => handler.tick().await,
		};

		match processed {
			Ok(batch) => {
				for event in batch {
					// No subscribers is fine
					let _ = events.send(event);
				}
			}
			Err(e) => warn!("Failed to process filesystem event: {e:#}"),
		}
	}
}
