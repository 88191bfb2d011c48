//! Outbound SMB shares of local directories

use std::collections::HashSet;
use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use super::samba::{render_config, SambaDaemon, SambaShare, SHARE_USER};
use crate::common::{ErrorClass, FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{NetworkShare, Root, ShareRecord, VirtualPath};
use crate::infra::event::Event;
use crate::ops::files::protection;

const SHARE_PASSWORD_LENGTH: usize = 16;

pub struct ShareService {
	ctx: CoreContext,
	samba: Arc<dyn SambaDaemon>,
	/// Serializes config rewrites so the last one always reflects the latest registry
	apply_lock: Mutex<()>,
	password_lock: Mutex<()>,
}

impl ShareService {
	pub fn new(ctx: CoreContext, samba: Arc<dyn SambaDaemon>) -> Self {
		Self {
			ctx,
			samba,
			apply_lock: Mutex::new(()),
			password_lock: Mutex::new(()),
		}
	}

	pub async fn shares(&self) -> Result<Vec<NetworkShare>> {
		let document = self.ctx.store.read().await?;
		Ok(name_shares(&document.shares, &self.ctx.config.owner_name))
	}

	/// Publish a directory; adding an existing share changes nothing
	#[instrument(skip(self), err)]
	pub async fn add_share(&self, path: &str) -> Result<NetworkShare> {
		let resolved = self.ctx.resolver.resolve_source(path).await?;
		let share_path = resolved.virtual_path.clone();
		if !protection::is_shareable(&share_path) || !resolved.metadata().await?.is_dir() {
			return Err(FilesError::OperationNotAllowed);
		}

		let added = self
			.ctx
			.store
			.update(|document| {
				if document.shares.iter().any(|share| share.path == share_path) {
					return false;
				}
				document.shares.push(ShareRecord {
					path: share_path.clone(),
				});
				true
			})
			.await?;

		if added {
			self.share_password().await?;
			self.apply().await?;
			info!("Shared {share_path}");
		}

		self.shares()
			.await?
			.into_iter()
			.find(|share| share.path == share_path)
			.ok_or(FilesError::NetworkShareNotExists)
	}

	/// Stop publishing a directory; unknown paths are ignored
	#[instrument(skip(self), err)]
	pub async fn remove_share(&self, path: &str) -> Result<()> {
		let share_path = VirtualPath::parse(path)?;
		let removed = self
			.ctx
			.store
			.update(|document| {
				let before = document.shares.len();
				document.shares.retain(|share| share.path != share_path);
				before - document.shares.len()
			})
			.await?;

		if removed > 0 {
			self.apply().await?;
			info!("Stopped sharing {share_path}");
		}
		Ok(())
	}

	/// Password SMB clients use; generated and applied on first use
	pub async fn share_password(&self) -> Result<String> {
		let _guard = self.password_lock.lock().await;
		if let Some(password) = self.ctx.store.read().await?.share_password {
			return Ok(password);
		}

		let password = rand::thread_rng()
			.sample_iter(&Alphanumeric)
			.take(SHARE_PASSWORD_LENGTH)
			.map(char::from)
			.collect::<String>();
		self.samba.set_password(SHARE_USER, &password).await?;
		self.ctx
			.store
			.update(|document| document.share_password = Some(password.clone()))
			.await?;

		info!("Generated share password");
		Ok(password)
	}

	/// Drop every share at or below `vanished`
	pub async fn prune(&self, vanished: &VirtualPath) -> Result<usize> {
		let removed = self
			.ctx
			.store
			.update(|document| {
				let before = document.shares.len();
				document
					.shares
					.retain(|share| !share.path.starts_with(vanished));
				before - document.shares.len()
			})
			.await?;

		if removed > 0 {
			info!("Removed {removed} share(s) under vanished {vanished}");
			self.apply().await?;
		}
		Ok(removed)
	}

	/// Drop shares whose directory no longer exists
	pub async fn prune_missing(&self) -> Result<usize> {
		let mut missing = vec![];
		for share in self.ctx.store.read().await?.shares {
			let present = match self.ctx.resolver.resolve_virtual(&share.path, true).await {
				Ok(resolved) => resolved.metadata().await.is_ok_and(|m| m.is_dir()),
				Err(e) if e.class() == ErrorClass::Io => return Err(e),
				Err(_) => false,
			};
			if !present {
				missing.push(share.path);
			}
		}
		if missing.is_empty() {
			return Ok(0);
		}

		let removed = self
			.ctx
			.store
			.update(|document| {
				let before = document.shares.len();
				document
					.shares
					.retain(|share| !missing.contains(&share.path));
				before - document.shares.len()
			})
			.await?;
		if removed > 0 {
			info!("Removed {removed} share(s) whose directory is gone");
			self.apply().await?;
		}
		Ok(removed)
	}

	/// Rewrite the Samba include file from the registry and reload
	pub async fn apply(&self) -> Result<()> {
		let _guard = self.apply_lock.lock().await;

		let mut sections = vec![];
		for share in self.shares().await? {
			let resolved = self.ctx.resolver.resolve_virtual(&share.path, false).await?;
			sections.push(SambaShare {
				name: share.name,
				path: resolved.real,
			});
		}

		self.samba.apply(&render_config(&sections)).await?;
		self.ctx.events.emit(Event::SharesChanged);
		Ok(())
	}
}

/// Derive public share names in registry order, numbering case-insensitive duplicates
pub fn name_shares(records: &[ShareRecord], owner_name: &str) -> Vec<NetworkShare> {
	let mut taken = HashSet::new();
	records
		.iter()
		.map(|record| {
			let base = if record.path.root() == Root::Home && record.path.is_root() {
				format!("{owner_name}'s Umbrel")
			} else {
				record.path.name().to_string()
			};

			let mut name = base.clone();
			let mut index = 2;
			while !taken.insert(name.to_lowercase()) {
				name = format!("{base} ({index})");
				index += 1;
			}

			NetworkShare {
				path: record.path.clone(),
				name,
			}
		})
		.collect()
}
