use tokio::fs;
use tracing::{info, instrument, warn};
use uf_utils::error::IoResultExt;

use super::remove_metadata;
use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{Root, VirtualPath};
use crate::ops::files::protection;
use crate::ops::files::unique_name::remove_entry;

/// Permanently delete an item from the trash or from a mounted network share
#[instrument(skip(ctx), err)]
pub async fn delete(ctx: &CoreContext, path: &str) -> Result<()> {
	let target = ctx.resolver.resolve_entry_source(path).await?;
	let virtual_path = &target.virtual_path;

	match virtual_path.root() {
		Root::Trash if !virtual_path.is_root() => {
			remove_entry(&target.real).await?;
			if virtual_path.depth() == 1 {
				remove_metadata(ctx, virtual_path.name()).await?;
			}
		}
		Root::Network if protection::is_network_backed(virtual_path) => {
			remove_entry(&target.real).await?;
		}
		_ => return Err(FilesError::OperationNotAllowed),
	}

	info!("Permanently deleted {virtual_path}");
	Ok(())
}

/// Delete every trashed item along with all sidecars, returning how many items went
#[instrument(skip(ctx), err)]
pub async fn empty_trash(ctx: &CoreContext) -> Result<usize> {
	let trash_dir = ctx
		.resolver
		.resolve_virtual(&VirtualPath::from_root(Root::Trash), true)
		.await?;

	let mut removed = 0;
	let mut entries = fs::read_dir(&trash_dir.real)
		.await
		.with_path(&trash_dir.real)?;
	while let Some(entry) = entries.next_entry().await.with_path(&trash_dir.real)? {
		remove_entry(&entry.path()).await?;
		match entry.file_name().to_str() {
			Some(name) => remove_metadata(ctx, name).await?,
			None => warn!("Trashed item with non UTF-8 name had no removable sidecar"),
		}
		removed += 1;
	}

	// Sidecars whose item is already gone
	let meta_dir = ctx.resolver.trash_meta_dir();
	if let Ok(mut leftovers) = fs::read_dir(meta_dir).await {
		while let Some(entry) = leftovers.next_entry().await.with_path(meta_dir)? {
			remove_entry(&entry.path()).await?;
		}
	}

	info!("Emptied trash ({removed} items)");
	Ok(removed)
}
