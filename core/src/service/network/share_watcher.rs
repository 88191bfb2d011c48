//! Keeps the share registry in step with the directories it points at

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uf_fs_watcher::{FsEvent, FsWatcher, WatcherConfig};

use super::shares::ShareService;
use crate::common::Result;
use crate::context::CoreContext;
use crate::domain::Root;
use crate::ops::files::resolver::PathResolver;
use crate::service::Service;

/// Prunes shares whose directory, or one of its ancestors, was removed or renamed
pub struct ShareWatcher {
	shares: Arc<ShareService>,
	resolver: Arc<PathResolver>,
	watched: Vec<PathBuf>,
	watcher: FsWatcher,
	task: Mutex<Option<JoinHandle<()>>>,
}

impl ShareWatcher {
	pub fn new(ctx: &CoreContext, shares: Arc<ShareService>) -> Self {
		Self {
			watched: [Root::Home, Root::External]
				.into_iter()
				.map(|root| ctx.resolver.root_dir(root).to_path_buf())
				.collect(),
			resolver: Arc::clone(&ctx.resolver),
			watcher: FsWatcher::new(WatcherConfig::default()),
			task: Mutex::new(None),
			shares,
		}
	}

	/// Apply one filesystem event; unrelated and repeated events change nothing
	pub async fn handle_event(
		shares: &ShareService,
		resolver: &PathResolver,
		event: &FsEvent,
	) -> Result<usize> {
		let Some(vanished) = event.vanished_path() else {
			return Ok(0);
		};
		let Some(path) = resolver.to_virtual(vanished) else {
			return Ok(0);
		};
		debug!("{path} vanished");
		shares.prune(&path).await
	}
}

#[async_trait]
impl Service for ShareWatcher {
	fn name(&self) -> &'static str {
		"share_watcher"
	}

	fn is_running(&self) -> bool {
		self.task.lock().is_some()
	}

	async fn start(&self) -> anyhow::Result<()> {
		if self.is_running() {
			warn!("Share watcher already running");
			return Ok(());
		}

		self.watcher.start().await?;
		let mut events = self.watcher.subscribe();
		for dir in &self.watched {
			self.watcher.watch(dir).await?;
		}
		self.shares.prune_missing().await?;

		let shares = Arc::clone(&self.shares);
		let resolver = Arc::clone(&self.resolver);
		let task = tokio::spawn(async move {
			loop {
				match events.recv().await {
					Ok(event) => {
						if let Err(e) = Self::handle_event(&shares, &resolver, &event).await {
							warn!("Failed to prune shares after {:?}: {e}", event.kind);
						}
					}
					Err(RecvError::Lagged(skipped)) => {
						warn!("Share watcher skipped {skipped} events, rescanning shares");
						if let Err(e) = shares.prune_missing().await {
							warn!("Failed to rescan shares: {e}");
						}
					}
					Err(RecvError::Closed) => break,
				}
			}
		});
		*self.task.lock() = Some(task);

		info!("Share watcher started");
		Ok(())
	}

	async fn stop(&self) -> anyhow::Result<()> {
		let task = self.task.lock().take();
		if let Some(task) = task {
			task.abort();
			self.watcher.stop().await;
			info!("Share watcher stopped");
		}
		Ok(())
	}
}
