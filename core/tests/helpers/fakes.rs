//! In-memory stand-ins for the host collaborators

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use uf_core::service::network::{SambaDaemon, ShareLocation, SmbClient};
use uf_core::volume::{DiskUsage, DiskUsageProvider};
use uf_core::{FilesError, Result};

/// Reports a fixed amount of free space
pub struct FixedDiskUsage {
	available: AtomicU64,
}

impl FixedDiskUsage {
	pub fn new(available: u64) -> Self {
		Self {
			available: AtomicU64::new(available),
		}
	}

	pub fn set_available(&self, available: u64) {
		self.available.store(available, Ordering::SeqCst);
	}
}

#[async_trait]
impl DiskUsageProvider for FixedDiskUsage {
	async fn usage(&self, _path: &Path) -> Result<DiskUsage> {
		let available = self.available.load(Ordering::SeqCst);
		Ok(DiskUsage {
			size: available.saturating_mul(2),
			total_used: available,
			available,
		})
	}
}

/// Remembers every config it was asked to apply
#[derive(Default)]
pub struct RecordingSamba {
	pub configs: Mutex<Vec<String>>,
	pub passwords: Mutex<Vec<(String, String)>>,
}

impl RecordingSamba {
	pub fn last_config(&self) -> Option<String> {
		self.configs.lock().last().cloned()
	}

	pub fn reloads(&self) -> usize {
		self.configs.lock().len()
	}
}

#[async_trait]
impl SambaDaemon for RecordingSamba {
	async fn apply(&self, config: &str) -> Result<()> {
		self.configs.lock().push(config.to_string());
		Ok(())
	}

	async fn set_password(&self, user: &str, password: &str) -> Result<()> {
		self.passwords
			.lock()
			.push((user.to_string(), password.to_string()));
		Ok(())
	}
}

/// Tracks mounts in memory; hosts are unreachable until marked otherwise
#[derive(Default)]
pub struct FakeSmbClient {
	reachable: Mutex<HashSet<String>>,
	mounted: Mutex<HashSet<PathBuf>>,
	shares: Mutex<HashMap<String, Vec<String>>>,
	fail_mounts: AtomicBool,
	mount_calls: AtomicUsize,
}

impl FakeSmbClient {
	pub fn set_reachable(&self, host: &str, reachable: bool) {
		let mut hosts = self.reachable.lock();
		if reachable {
			hosts.insert(host.to_string());
		} else {
			hosts.remove(host);
		}
	}

	pub fn set_shares(&self, host: &str, shares: &[&str]) {
		self.shares.lock().insert(
			host.to_string(),
			shares.iter().map(|share| share.to_string()).collect(),
		);
	}

	pub fn fail_mounts(&self, fail: bool) {
		self.fail_mounts.store(fail, Ordering::SeqCst);
	}

	pub fn mount_calls(&self) -> usize {
		self.mount_calls.load(Ordering::SeqCst)
	}

	pub fn is_mounted_at(&self, mount_point: &Path) -> bool {
		self.mounted.lock().contains(mount_point)
	}
}

#[async_trait]
impl SmbClient for FakeSmbClient {
	async fn mount(&self, location: ShareLocation<'_>, mount_point: &Path) -> Result<()> {
		self.mount_calls.fetch_add(1, Ordering::SeqCst);
		if self.fail_mounts.load(Ordering::SeqCst)
			|| !self.reachable.lock().contains(location.host)
		{
			return Err(FilesError::command("mount", "host is down"));
		}
		assert!(mount_point.is_dir(), "mount point must exist before mounting");
		self.mounted.lock().insert(mount_point.to_path_buf());
		Ok(())
	}

	async fn unmount(&self, mount_point: &Path) -> Result<()> {
		self.mounted.lock().remove(mount_point);
		Ok(())
	}

	async fn is_mounted(&self, mount_point: &Path) -> Result<bool> {
		Ok(self.mounted.lock().contains(mount_point))
	}

	async fn is_reachable(&self, host: &str) -> bool {
		self.reachable.lock().contains(host)
	}

	async fn list_shares(&self, host: &str, _username: &str, _password: &str) -> Result<Vec<String>> {
		Ok(self.shares.lock().get(host).cloned().unwrap_or_default())
	}
}
