//! # Copy Strategy Implementations
//!
//! Two strategies cover every local transfer:
//!
//! 1. **`LocalMoveStrategy`** - Atomic filesystem rename; falls back to a preserving
//!    copy followed by removal of the source when the destination is on another
//!    filesystem.
//! 2. **`PreservingCopyStrategy`** - Recursive copy that keeps symlinks as links and
//!    carries over permission bits, ownership (when privileged) and timestamps.
//!
//! Both report progress through a callback taking `(bytes_done, bytes_total)`.

use std::fs::{File, Metadata, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use filetime::FileTime;
use tokio::fs;
use tracing::{debug, warn};
use uf_utils::error::{FileIOError, IoResultExt};

use super::size::tree_size;
use crate::common::Result;
use crate::ops::files::unique_name::remove_entry;

/// Called with `(bytes_done, bytes_total)`
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Minimum number of bytes between two progress reports
const PROGRESS_STEP: u64 = 4 * 1024 * 1024;

#[async_trait]
pub trait CopyStrategy: Send + Sync {
	/// Transfer `source` to `destination`, which must not exist yet
	async fn execute(
		&self,
		source: &Path,
		destination: &Path,
		progress_callback: Option<ProgressCallback>,
	) -> Result<u64>;
}

/// Strategy for an atomic move, degrading to copy-then-delete across filesystems
pub struct LocalMoveStrategy;

#[async_trait]
impl CopyStrategy for LocalMoveStrategy {
	async fn execute(
		&self,
		source: &Path,
		destination: &Path,
		progress_callback: Option<ProgressCallback>,
	) -> Result<u64> {
		// Read size before rename since source path becomes invalid after move.
		let size = tree_size(source).await?;

		if let Some(callback) = &progress_callback {
			callback(0, size);
		}

		match fs::rename(source, destination).await {
			Ok(()) => {
				if let Some(callback) = &progress_callback {
					callback(size, size);
				}
				debug!(
					"Atomic move: {} -> {}",
					source.display(),
					destination.display()
				);
				Ok(size)
			}
			Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
				debug!(
					"Cross-device move, copying {} -> {}",
					source.display(),
					destination.display()
				);
				let copied = match PreservingCopyStrategy
					.execute(source, destination, progress_callback)
					.await
				{
					Ok(copied) => copied,
					Err(e) => {
						// The source is untouched, so drop the partial copy
						if let Err(cleanup) = remove_entry(destination).await {
							warn!("Failed to clean up partial move target: {cleanup}");
						}
						return Err(e);
					}
				};
				remove_entry(source).await?;
				Ok(copied)
			}
			Err(e) => Err(FileIOError::from_std_io_err_with_msg(source, e, "moving").into()),
		}
	}
}

/// Strategy for a recursive copy that preserves links and attributes
pub struct PreservingCopyStrategy;

#[async_trait]
impl CopyStrategy for PreservingCopyStrategy {
	async fn execute(
		&self,
		source: &Path,
		destination: &Path,
		progress_callback: Option<ProgressCallback>,
	) -> Result<u64> {
		let total = tree_size(source).await?;
		let source = source.to_path_buf();
		let destination = destination.to_path_buf();

		let copied = tokio::task::spawn_blocking(move || {
			let mut progress = CopyProgress::new(total, progress_callback);
			copy_tree(&source, &destination, &mut progress)?;
			progress.finish();
			debug!(
				"Preserving copy: {} -> {} ({} bytes)",
				source.display(),
				destination.display(),
				progress.done
			);
			Ok::<_, FileIOError>(progress.done)
		})
		.await??;

		Ok(copied)
	}
}

struct CopyProgress {
	done: u64,
	total: u64,
	last_reported: u64,
	callback: Option<ProgressCallback>,
}

impl CopyProgress {
	fn new(total: u64, callback: Option<ProgressCallback>) -> Self {
		if let Some(callback) = &callback {
			callback(0, total);
		}
		Self {
			done: 0,
			total,
			last_reported: 0,
			callback,
		}
	}

	fn advance(&mut self, bytes: u64) {
		self.done += bytes;
		if self.done - self.last_reported >= PROGRESS_STEP {
			self.report();
		}
	}

	fn finish(&mut self) {
		if self.last_reported != self.done || self.done == 0 {
			self.report();
		}
	}

	fn report(&mut self) {
		self.last_reported = self.done;
		if let Some(callback) = &self.callback {
			callback(self.done, self.total.max(self.done));
		}
	}
}

fn copy_tree(
	source: &Path,
	destination: &Path,
	progress: &mut CopyProgress,
) -> std::result::Result<(), FileIOError> {
	let metadata = std::fs::symlink_metadata(source).with_path(source)?;
	let file_type = metadata.file_type();

	if file_type.is_symlink() {
		let target = std::fs::read_link(source).with_path(source)?;
		std::os::unix::fs::symlink(&target, destination).with_path(destination)?;
		preserve_owner(destination, &metadata).with_path(destination)?;
		filetime::set_symlink_file_times(
			destination,
			FileTime::from_last_access_time(&metadata),
			FileTime::from_last_modification_time(&metadata),
		)
		.with_path(destination)?;
		progress.advance(metadata.len());
	} else if file_type.is_dir() {
		std::fs::create_dir(destination).with_path(destination)?;
		let children = std::fs::read_dir(source)
			.with_path(source)?
			.map(|entry| entry.map(|entry| entry.file_name()))
			.collect::<io::Result<Vec<_>>>()
			.with_path(source)?;
		for name in children {
			copy_tree(&source.join(&name), &destination.join(&name), progress)?;
		}
		// Applied after the children so a read-only directory can still be filled
		apply_metadata(destination, &metadata).with_path(destination)?;
	} else {
		copy_file_contents(source, destination, progress)?;
		apply_metadata(destination, &metadata).with_path(destination)?;
	}

	Ok(())
}

fn copy_file_contents(
	source: &Path,
	destination: &Path,
	progress: &mut CopyProgress,
) -> std::result::Result<(), FileIOError> {
	let mut reader = File::open(source).with_path(source)?;
	let mut writer = OpenOptions::new()
		.write(true)
		.create_new(true)
		.open(destination)
		.with_path(destination)?;

	let mut buffer = vec![0u8; CHUNK_SIZE];
	loop {
		let read = reader.read(&mut buffer).with_path(source)?;
		if read == 0 {
			break;
		}
		writer.write_all(&buffer[..read]).with_path(destination)?;
		progress.advance(read as u64);
	}
	writer.flush().with_path(destination)?;
	Ok(())
}

fn apply_metadata(path: &Path, metadata: &Metadata) -> io::Result<()> {
	preserve_owner(path, metadata)?;
	std::fs::set_permissions(path, metadata.permissions())?;
	filetime::set_file_times(
		path,
		FileTime::from_last_access_time(metadata),
		FileTime::from_last_modification_time(metadata),
	)
}

/// Ownership is only carried over when the process may change it
fn preserve_owner(path: &Path, metadata: &Metadata) -> io::Result<()> {
	match std::os::unix::fs::lchown(path, Some(metadata.uid()), Some(metadata.gid())) {
		Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(()),
		other => other,
	}
}
