//! Inbound network shares mounted under `/Network/<host>/<share>`
//!
//! The registry in the state document is the source of truth for which
//! shares should exist. Live mount state is only ever observed, and
//! reconciliation converges it towards the registry.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::{fs, sync::Mutex};
use tracing::{debug, info, instrument, warn};
use uf_utils::error::FileIOError;

use super::smb::{ShareLocation, SmbClient};
use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{NetworkShareRecord, NetworkShareStatus, Root, VirtualPath};
use crate::infra::event::Event;

pub struct NetworkShareService {
	ctx: CoreContext,
	smb: Arc<dyn SmbClient>,
	/// Held by every mount mutation; reconciliation only ever try-locks it
	mounts: Mutex<()>,
}

impl NetworkShareService {
	pub fn new(ctx: CoreContext, smb: Arc<dyn SmbClient>) -> Self {
		Self {
			ctx,
			smb,
			mounts: Mutex::new(()),
		}
	}

	/// Host directory backing a `/Network/<host>/<share>` path.
	///
	/// Built lexically: stat-ing through a dead CIFS mount can block.
	fn mount_point(&self, mount_path: &VirtualPath) -> PathBuf {
		let mut real = self.ctx.resolver.root_dir(Root::Network).to_path_buf();
		real.extend(mount_path.segments());
		real
	}

	fn host_dir(&self, host: &str) -> PathBuf {
		self.ctx.resolver.root_dir(Root::Network).join(host)
	}

	pub async fn list(&self) -> Result<Vec<NetworkShareStatus>> {
		let records = self.ctx.store.read().await?.network_shares;
		let mut statuses = Vec::with_capacity(records.len());
		for record in records {
			let is_mounted = self.smb.is_mounted(&self.mount_point(&record.mount_path)).await?;
			statuses.push(NetworkShareStatus {
				host: record.host,
				share: record.share,
				username: record.username,
				mount_path: record.mount_path,
				is_mounted,
			});
		}
		Ok(statuses)
	}

	/// Mount a remote share and remember it
	#[instrument(skip(self, password), err)]
	pub async fn add(
		&self,
		host: &str,
		share: &str,
		username: &str,
		password: &str,
	) -> Result<VirtualPath> {
		let host = host.trim();
		let share = share.trim().trim_matches('/');
		if host.is_empty() {
			return Err(FilesError::invalid_input("host", "host is required"));
		}
		if share.is_empty() {
			return Err(FilesError::invalid_input("share", "share is required"));
		}
		let mount_path = VirtualPath::from_root(Root::Network)
			.join(host)?
			.join(share)?;

		let _guard = self.mounts.lock().await;
		let registered = self.ctx.store.read().await?.network_shares;
		if registered.iter().any(|record| record.mount_path == mount_path) {
			return Err(FilesError::NetworkShareAlreadyExists);
		}

		let record = NetworkShareRecord {
			host: host.to_string(),
			share: share.to_string(),
			username: username.to_string(),
			password: password.to_string(),
			mount_path: mount_path.clone(),
		};
		self.mount_record(&record).await?;

		let persisted = self
			.ctx
			.store
			.update(|document| document.network_shares.push(record.clone()))
			.await;
		if let Err(e) = persisted {
			self.release(&record).await;
			return Err(e);
		}

		info!("Added network share {mount_path}");
		Ok(mount_path)
	}

	/// Unmount a share and forget it
	#[instrument(skip(self), err)]
	pub async fn remove(&self, mount_path: &str) -> Result<()> {
		let mount_path = VirtualPath::parse(mount_path)?;

		let _guard = self.mounts.lock().await;
		let record = self
			.ctx
			.store
			.read()
			.await?
			.network_shares
			.into_iter()
			.find(|record| record.mount_path == mount_path)
			.ok_or(FilesError::NetworkShareNotExists)?;

		let mount_point = self.mount_point(&mount_path);
		if self.smb.is_mounted(&mount_point).await? {
			self.smb.unmount(&mount_point).await?;
			self.ctx.events.emit(Event::NetworkShareUnmounted {
				mount_path: mount_path.clone(),
			});
		}
		self.remove_mount_dirs(&record).await?;

		self.ctx
			.store
			.update(|document| {
				document
					.network_shares
					.retain(|record| record.mount_path != mount_path)
			})
			.await?;

		info!("Removed network share {mount_path}");
		Ok(())
	}

	/// Mount every registered share that is not mounted yet
	pub async fn mount_all(&self) -> Result<usize> {
		let _guard = self.mounts.lock().await;
		let mut mounted = 0;
		for record in self.ctx.store.read().await?.network_shares {
			let mount_point = self.mount_point(&record.mount_path);
			if self.smb.is_mounted(&mount_point).await? {
				continue;
			}
			match self.mount_record(&record).await {
				Ok(()) => mounted += 1,
				Err(e) => warn!("Failed to mount {}: {e}", record.mount_path),
			}
		}
		Ok(mounted)
	}

	/// Unmount everything and remove the mount points; the registry is kept
	pub async fn unmount_all(&self) -> Result<()> {
		let _guard = self.mounts.lock().await;
		for record in self.ctx.store.read().await?.network_shares {
			self.release(&record).await;
		}
		Ok(())
	}

	/// One reconciliation pass.
	///
	/// Returns `false` without doing anything when another mount operation
	/// holds the lock.
	pub async fn reconcile(&self) -> Result<bool> {
		let Ok(_guard) = self.mounts.try_lock() else {
			debug!("Mount operation in progress, skipping reconciliation");
			return Ok(false);
		};

		for record in self.ctx.store.read().await?.network_shares {
			let mount_point = self.mount_point(&record.mount_path);
			let mounted = self.smb.is_mounted(&mount_point).await?;
			let reachable = self.smb.is_reachable(&record.host).await;

			match (mounted, reachable) {
				(false, true) => match self.mount_record(&record).await {
					Ok(()) => info!("Remounted {}", record.mount_path),
					Err(e) => warn!("Failed to remount {}: {e}", record.mount_path),
				},
				(true, false) => {
					warn!("{} is unreachable, marking it unmounted", record.host);
					match self.smb.unmount(&mount_point).await {
						Ok(()) => self.ctx.events.emit(Event::NetworkShareUnmounted {
							mount_path: record.mount_path.clone(),
						}),
						Err(e) => warn!("Failed to unmount {}: {e}", record.mount_path),
					}
				}
				_ => {}
			}
		}
		Ok(true)
	}

	/// Create the mount point and mount; on failure leave no directories behind
	async fn mount_record(&self, record: &NetworkShareRecord) -> Result<()> {
		let host_dir = self.host_dir(&record.host);
		let mount_point = self.mount_point(&record.mount_path);

		let created_host = create_dir_if_missing(&host_dir).await?;
		let created_mount_point = match create_dir_if_missing(&mount_point).await {
			Ok(created) => created,
			Err(e) => {
				if created_host {
					remove_empty_dir(&host_dir).await;
				}
				return Err(e);
			}
		};

		let location = ShareLocation {
			host: &record.host,
			share: &record.share,
			username: &record.username,
			password: &record.password,
		};
		if let Err(e) = self.smb.mount(location, &mount_point).await {
			if created_mount_point {
				remove_empty_dir(&mount_point).await;
			}
			if created_host {
				remove_empty_dir(&host_dir).await;
			}
			return Err(e);
		}

		self.ctx.events.emit(Event::NetworkShareMounted {
			mount_path: record.mount_path.clone(),
		});
		Ok(())
	}

	/// Best-effort unmount plus mount point removal
	async fn release(&self, record: &NetworkShareRecord) {
		let mount_point = self.mount_point(&record.mount_path);
		match self.smb.is_mounted(&mount_point).await {
			Ok(true) => match self.smb.unmount(&mount_point).await {
				Ok(()) => self.ctx.events.emit(Event::NetworkShareUnmounted {
					mount_path: record.mount_path.clone(),
				}),
				Err(e) => {
					warn!("Failed to unmount {}: {e}", record.mount_path);
					return;
				}
			},
			Ok(false) => {}
			Err(e) => {
				warn!("Failed to read mount state of {}: {e}", record.mount_path);
				return;
			}
		}
		if let Err(e) = self.remove_mount_dirs(record).await {
			warn!("Failed to remove mount point of {}: {e}", record.mount_path);
		}
	}

	/// Remove the (unmounted) mount point and, when empty, its host directory
	async fn remove_mount_dirs(&self, record: &NetworkShareRecord) -> Result<()> {
		let mount_point = self.mount_point(&record.mount_path);
		match fs::remove_dir(&mount_point).await {
			Ok(()) => {}
			Err(e) if e.kind() == io::ErrorKind::NotFound => {}
			Err(e) => return Err(FileIOError::from_std_io_err(&mount_point, e).into()),
		}
		remove_empty_dir(&self.host_dir(&record.host)).await;
		Ok(())
	}
}

async fn create_dir_if_missing(path: &Path) -> Result<bool> {
	match fs::create_dir(path).await {
		Ok(()) => Ok(true),
		Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
		Err(e) => Err(FileIOError::from_std_io_err(path, e).into()),
	}
}

/// Remove a directory only if it is empty
async fn remove_empty_dir(path: &Path) {
	if let Err(e) = fs::remove_dir(path).await {
		debug!("Kept {}: {e}", path.display());
	}
}
