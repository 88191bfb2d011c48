//! Collision handling and per-directory name claiming
//!
//! A claim probes the directory and reserves the chosen name while holding that
//! directory's lock, so two concurrent operations never pick the same
//! `name (2).ext`. The reservation lives until the [`NameClaim`] is dropped.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::fs;
use tracing::{debug, trace};
use uf_utils::error::{FileIOError, IoResultExt};

use crate::common::{FilesError, Result};
use crate::domain::CollisionPolicy;

/// Highest index tried when numbering duplicates
pub const MAX_DUPLICATE_INDEX: u32 = 100;

/// Split a name into base and extension on the last `.`.
///
/// Directories and dotfiles like `.bashrc` have no extension.
pub fn split_name(name: &str, is_dir: bool) -> (&str, Option<&str>) {
	if is_dir {
		return (name, None);
	}
	match name.rfind('.') {
		Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
		_ => (name, None),
	}
}

/// `name` with ` (index)` inserted before the extension
pub fn indexed_name(name: &str, index: u32, is_dir: bool) -> String {
	match split_name(name, is_dir) {
		(base, Some(ext)) => format!("{base} ({index}).{ext}"),
		(base, None) => format!("{base} ({index})"),
	}
}

/// Remove whatever is at `path`: directories recursively, links as links
pub async fn remove_entry(path: &Path) -> Result<()> {
	let metadata = fs::symlink_metadata(path).await.with_path(path)?;
	if metadata.is_dir() {
		fs::remove_dir_all(path).await.with_path(path)?;
	} else {
		fs::remove_file(path).await.with_path(path)?;
	}
	Ok(())
}

async fn exists_on_disk(path: &Path) -> Result<bool> {
	match fs::symlink_metadata(path).await {
		Ok(_) => Ok(true),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
		Err(e) => Err(FileIOError::from_std_io_err(path, e).into()),
	}
}

type Reserved = Arc<Mutex<HashSet<PathBuf>>>;

#[derive(Default)]
pub struct NameClaims {
	dir_locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
	reserved: Reserved,
}

/// A reserved destination name; released on drop
#[derive(Debug)]
pub struct NameClaim {
	pub name: String,
	pub path: PathBuf,
	/// Something already exists at `path` and the policy is `replace`
	pub replaces_existing: bool,
	reserved: Reserved,
}

impl Drop for NameClaim {
	fn drop(&mut self) {
		self.reserved.lock().remove(&self.path);
	}
}

impl std::fmt::Debug for NameClaims {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NameClaims")
			.field("reserved", &self.reserved.lock().len())
			.finish()
	}
}

impl NameClaims {
	pub fn new() -> Self {
		Self::default()
	}

	fn dir_lock(&self, dir: &Path) -> Arc<tokio::sync::Mutex<()>> {
		Arc::clone(self.dir_locks.lock().entry(dir.to_path_buf()).or_default())
	}

	fn release_dir_lock(&self, dir: &Path) {
		let mut locks = self.dir_locks.lock();
		if locks
			.get(dir)
			.is_some_and(|lock| Arc::strong_count(lock) == 1)
		{
			locks.remove(dir);
		}
	}

	fn is_reserved(&self, path: &Path) -> bool {
		self.reserved.lock().contains(path)
	}

	async fn is_taken(&self, path: &Path) -> Result<bool> {
		Ok(self.is_reserved(path) || exists_on_disk(path).await?)
	}

	/// Decide the final name for `desired` inside `dir` and reserve it
	pub async fn claim(
		&self,
		dir: &Path,
		desired: &str,
		policy: CollisionPolicy,
		is_dir: bool,
	) -> Result<NameClaim> {
		let lock = self.dir_lock(dir);
		let result = {
			let _guard = lock.lock().await;
			self.probe(dir, desired, policy, is_dir)
				.await
				.map(|(name, replaces_existing)| {
					let path = dir.join(&name);
					self.reserved.lock().insert(path.clone());
					(name, path, replaces_existing)
				})
		};
		drop(lock);
		self.release_dir_lock(dir);

		let (name, path, replaces_existing) = result?;
		trace!("Claimed {}", path.display());

		Ok(NameClaim {
			name,
			path,
			replaces_existing,
			reserved: Arc::clone(&self.reserved),
		})
	}

	async fn probe(
		&self,
		dir: &Path,
		desired: &str,
		policy: CollisionPolicy,
		is_dir: bool,
	) -> Result<(String, bool)> {
		let path = dir.join(desired);
		match policy {
			CollisionPolicy::Error => {
				if self.is_taken(&path).await? {
					return Err(FilesError::DestinationAlreadyExists);
				}
				Ok((desired.to_string(), false))
			}
			CollisionPolicy::Replace => {
				if self.is_reserved(&path) {
					return Err(FilesError::DestinationAlreadyExists);
				}
				Ok((desired.to_string(), exists_on_disk(&path).await?))
			}
			CollisionPolicy::KeepBoth => {
				if !self.is_taken(&path).await? {
					return Ok((desired.to_string(), false));
				}
				for index in 2..=MAX_DUPLICATE_INDEX {
					let candidate = indexed_name(desired, index, is_dir);
					if !self.is_taken(&dir.join(&candidate)).await? {
						debug!("Renamed '{desired}' to '{candidate}' to avoid a collision");
						return Ok((candidate, false));
					}
				}
				Err(FilesError::UniqueNameIndexExceeded)
			}
		}
	}
}
