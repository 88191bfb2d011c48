//! Background services and the share services built on them

pub mod network;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::context::CoreContext;
use network::{
	MountWatcher, NetworkShareService, SambaDaemon, ShareDiscovery, ShareService, ShareWatcher,
	SmbClient,
};

/// Trait for background services
#[async_trait]
pub trait Service: Send + Sync {
	/// Start the service
	async fn start(&self) -> Result<()>;

	/// Stop the service gracefully
	async fn stop(&self) -> Result<()>;

	/// Check if the service is running
	fn is_running(&self) -> bool;

	/// Get service name for logging
	fn name(&self) -> &'static str;
}

/// Container for all services
pub struct Services {
	pub shares: Arc<ShareService>,
	pub network_shares: Arc<NetworkShareService>,
	pub discovery: ShareDiscovery,
	share_watcher: ShareWatcher,
	mount_watcher: MountWatcher,
}

impl Services {
	pub fn new(ctx: &CoreContext, samba: Arc<dyn SambaDaemon>, smb: Arc<dyn SmbClient>) -> Self {
		info!("Initializing services");
		let network = &ctx.config.network;

		let shares = Arc::new(ShareService::new(ctx.clone(), samba));
		let network_shares = Arc::new(NetworkShareService::new(ctx.clone(), Arc::clone(&smb)));

		Self {
			share_watcher: ShareWatcher::new(ctx, Arc::clone(&shares)),
			mount_watcher: MountWatcher::new(Arc::clone(&network_shares), network.watch_interval()),
			discovery: ShareDiscovery::new(smb, network.discovery_timeout()),
			shares,
			network_shares,
		}
	}

	fn background(&self) -> [&dyn Service; 2] {
		[&self.share_watcher, &self.mount_watcher]
	}

	/// Start all services
	pub async fn start_all(&self) -> Result<()> {
		info!("Starting all services");
		self.shares.apply().await?;
		for service in self.background() {
			service.start().await?;
			info!("Started {}", service.name());
		}
		Ok(())
	}

	/// Stop all services gracefully, in reverse start order
	pub async fn stop_all(&self) -> Result<()> {
		info!("Stopping all services");
		for service in self.background().into_iter().rev() {
			service.stop().await?;
		}
		Ok(())
	}
}
