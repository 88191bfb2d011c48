//! Trash, restore and permanent deletion
//!
//! Trashing moves an item under the trash root and records where it came from
//! in a JSON sidecar, `<trash-meta>/<name>.json`. The sidecar lives and dies
//! with the top-level trashed item.

pub mod permanent;
pub mod restore;
pub mod trash;

pub use permanent::{delete, empty_trash};
pub use restore::restore;
pub use trash::trash;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use uf_utils::error::{FileIOError, IoResultExt};

use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::VirtualPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashMetadata {
	/// Where the item lived before it was trashed
	pub path: VirtualPath,
	/// Milliseconds since the unix epoch
	pub deleted_at: i64,
}

fn metadata_path(ctx: &CoreContext, trashed_name: &str) -> PathBuf {
	ctx.resolver
		.trash_meta_dir()
		.join(format!("{trashed_name}.json"))
}

pub(crate) async fn write_metadata(
	ctx: &CoreContext,
	trashed_name: &str,
	metadata: &TrashMetadata,
) -> Result<()> {
	let dir = ctx.resolver.trash_meta_dir();
	fs::create_dir_all(dir).await.with_path(dir)?;

	let path = metadata_path(ctx, trashed_name);
	let json = serde_json::to_vec_pretty(metadata)
		.map_err(|e| FilesError::Store(format!("encoding trash metadata: {e}")))?;
	let tmp = path.with_extension("json.tmp");
	fs::write(&tmp, json).await.with_path(&tmp)?;
	fs::rename(&tmp, &path).await.with_path(&path)?;
	Ok(())
}

pub(crate) async fn read_metadata(ctx: &CoreContext, trashed_name: &str) -> Result<TrashMetadata> {
	let path = metadata_path(ctx, trashed_name);
	let json = match fs::read(&path).await {
		Ok(json) => json,
		Err(e) if e.kind() == io::ErrorKind::NotFound => {
			return Err(FilesError::TrashMetaNotExists)
		}
		Err(e) => return Err(FileIOError::from_std_io_err(&path, e).into()),
	};
	serde_json::from_slice(&json)
		.map_err(|e| FilesError::Store(format!("{}: {e}", path.display())))
}

/// Remove a sidecar; a missing one is not an error
pub(crate) async fn remove_metadata(ctx: &CoreContext, trashed_name: &str) -> Result<()> {
	let path = metadata_path(ctx, trashed_name);
	match fs::remove_file(&path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(FileIOError::from_std_io_err(&path, e).into()),
	}
}
