//! Persisted registry of outbound shares and inbound network mounts
//!
//! A single YAML document. Every mutation is a read-modify-write under one
//! async lock, and the file is replaced atomically.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::debug;
use uf_utils::error::{FileIOError, IoResultExt};

use crate::common::{FilesError, Result};
use crate::domain::{NetworkShareRecord, ShareRecord};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilesDocument {
	pub shares: Vec<ShareRecord>,
	pub share_password: Option<String>,
	pub network_shares: Vec<NetworkShareRecord>,
}

pub struct FilesStore {
	path: PathBuf,
	lock: Mutex<()>,
}

impl FilesStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			lock: Mutex::new(()),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub async fn read(&self) -> Result<FilesDocument> {
		let _guard = self.lock.lock().await;
		self.load().await
	}

	/// Apply `f` to the document and persist the result
	pub async fn update<T>(&self, f: impl FnOnce(&mut FilesDocument) -> T) -> Result<T> {
		let _guard = self.lock.lock().await;
		let mut document = self.load().await?;
		let out = f(&mut document);
		self.persist(&document).await?;
		Ok(out)
	}

	async fn load(&self) -> Result<FilesDocument> {
		match fs::read_to_string(&self.path).await {
			Ok(yaml) if yaml.trim().is_empty() => Ok(FilesDocument::default()),
			Ok(yaml) => serde_yaml::from_str(&yaml)
				.map_err(|e| FilesError::Store(format!("{}: {e}", self.path.display()))),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FilesDocument::default()),
			Err(e) => Err(FileIOError::from_std_io_err(&self.path, e).into()),
		}
	}

	async fn persist(&self, document: &FilesDocument) -> Result<()> {
		let yaml = serde_yaml::to_string(document).map_err(|e| FilesError::Store(e.to_string()))?;

		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).await.with_path(parent)?;
		}
		let tmp = self.path.with_extension("yaml.tmp");
		fs::write(&tmp, yaml).await.with_path(&tmp)?;
		fs::rename(&tmp, &self.path).await.with_path(&self.path)?;
		debug!("Persisted state to {}", self.path.display());
		Ok(())
	}
}
