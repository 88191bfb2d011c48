use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::mounts::NetworkShareService;
use crate::service::Service;

/// Periodically converges live mounts towards the registry
pub struct MountWatcher {
	mounts: Arc<NetworkShareService>,
	period: Duration,
	task: Mutex<Option<JoinHandle<()>>>,
}

impl MountWatcher {
	pub fn new(mounts: Arc<NetworkShareService>, period: Duration) -> Self {
		Self {
			mounts,
			period,
			task: Mutex::new(None),
		}
	}
}

#[async_trait]
impl Service for MountWatcher {
	fn name(&self) -> &'static str {
		"mount_watcher"
	}

	fn is_running(&self) -> bool {
		self.task.lock().is_some()
	}

	async fn start(&self) -> anyhow::Result<()> {
		if self.is_running() {
			warn!("Mount watcher already running");
			return Ok(());
		}

		let mounted = self.mounts.mount_all().await?;
		info!("Mounted {mounted} network share(s) at startup");

		let mounts = Arc::clone(&self.mounts);
		let period = self.period;
		let task = tokio::spawn(async move {
			let mut ticker = interval_at(Instant::now() + period, period);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
			loop {
				ticker.tick().await;
				if let Err(e) = mounts.reconcile().await {
					warn!("Network share reconciliation failed: {e}");
				}
			}
		});
		*self.task.lock() = Some(task);

		info!("Mount watcher started (every {period:?})");
		Ok(())
	}

	async fn stop(&self) -> anyhow::Result<()> {
		let task = self.task.lock().take();
		if let Some(task) = task {
			task.abort();
			self.mounts.unmount_all().await?;
			info!("Mount watcher stopped");
		}
		Ok(())
	}
}
