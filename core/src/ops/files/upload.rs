//! Streamed uploads
//!
//! The body is written to a hidden temporary next to the destination and
//! renamed into place once complete. The temporary is owned by a drop guard,
//! so an error or a dropped request future never leaves it behind.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, trace, warn};
use uf_utils::error::IoResultExt;

use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{CollisionPolicy, VirtualPath};
use crate::infra::event::{FileOperation, ProgressReporter};
use crate::ops::files::{
	create_folder::create_parent_directories, rename::validation::validate_filename,
	unique_name::remove_entry,
};

pub const UPLOAD_TEMP_SUFFIX: &str = ".umbrel-upload";

/// Whether `name` is an in-flight upload temporary
pub fn is_upload_temp_name(name: &str) -> bool {
	name.len() > UPLOAD_TEMP_SUFFIX.len() + 1
		&& name.starts_with('.')
		&& name.ends_with(UPLOAD_TEMP_SUFFIX)
}

fn temp_name(final_name: &str) -> String {
	format!(".{final_name}{UPLOAD_TEMP_SUFFIX}")
}

struct TempFileGuard {
	path: Option<PathBuf>,
}

impl TempFileGuard {
	fn new(path: &Path) -> Self {
		Self {
			path: Some(path.to_path_buf()),
		}
	}

	fn disarm(&mut self) {
		self.path = None;
	}
}

impl Drop for TempFileGuard {
	fn drop(&mut self) {
		let Some(path) = self.path.take() else {
			return;
		};
		match std::fs::remove_file(&path) {
			Ok(()) => trace!("Removed upload temporary {}", path.display()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => {}
			Err(e) => warn!("Failed to remove upload temporary {}: {e}", path.display()),
		}
	}
}

/// Stream `body` into `path`, creating missing parent directories
#[instrument(skip(ctx, body), err)]
pub async fn upload<S>(
	ctx: &CoreContext,
	path: &str,
	collision: CollisionPolicy,
	mut body: S,
) -> Result<VirtualPath>
where
	S: Stream<Item = io::Result<Bytes>> + Unpin,
{
	if path.trim().is_empty() {
		return Err(FilesError::invalid_input("path", "path is required"));
	}
	let target = VirtualPath::parse(path)?;
	let parent_path = target.parent().ok_or(FilesError::OperationNotAllowed)?;
	let name = target.name();
	validate_filename(name)?;

	let existing = ctx.resolver.resolve_virtual(&target, false).await?;
	if existing.exists && collision == CollisionPolicy::Error {
		return Err(FilesError::DestinationAlreadyExists);
	}

	let parent = create_parent_directories(ctx, &parent_path).await?;

	let temp = ctx
		.claims
		.claim(&parent.real, &temp_name(name), CollisionPolicy::KeepBoth, false)
		.await?;
	let mut guard = TempFileGuard::new(&temp.path);

	let reporter = ProgressReporter::new(&ctx.events, FileOperation::Upload);
	let mut file = fs::File::create(&temp.path)
		.await
		.map_err(FilesError::WriteFailed)?;
	let mut written = 0u64;
	while let Some(chunk) = body.next().await {
		let chunk = chunk.map_err(FilesError::UploadAborted)?;
		file.write_all(&chunk)
			.await
			.map_err(FilesError::WriteFailed)?;
		written += chunk.len() as u64;
	}
	file.flush().await.map_err(FilesError::WriteFailed)?;
	file.sync_all().await.map_err(FilesError::WriteFailed)?;
	drop(file);

	// Final name is only fixed now, under the directory lock
	let claim = ctx.claims.claim(&parent.real, name, collision, false).await?;
	if claim.replaces_existing
		&& fs::symlink_metadata(&claim.path)
			.await
			.with_path(&claim.path)?
			.is_dir()
	{
		remove_entry(&claim.path).await?;
	}
	fs::rename(&temp.path, &claim.path)
		.await
		.map_err(FilesError::WriteFailed)?;
	guard.disarm();

	let uploaded = parent_path.join(&claim.name)?;
	reporter.completed(&uploaded);
	info!("Uploaded {uploaded} ({written} bytes)");
	Ok(uploaded)
}
