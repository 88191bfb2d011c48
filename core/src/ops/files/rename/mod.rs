//! Rename an entry in place

pub mod validation;

use tokio::fs;
use tracing::{info, instrument};
use uf_utils::error::IoResultExt;

use self::validation::validate_filename;
use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{CollisionPolicy, Root, VirtualPath};
use crate::ops::files::protection;

#[instrument(skip(ctx), err)]
pub async fn rename(ctx: &CoreContext, path: &str, new_name: &str) -> Result<VirtualPath> {
	validate_filename(new_name)?;

	let source = ctx.resolver.resolve_entry_source(path).await?;
	let source_path = &source.virtual_path;
	if matches!(source_path.root(), Root::Trash | Root::Backups) {
		return Err(FilesError::OperationNotAllowed);
	}
	protection::ensure_not_protected(source_path)?;

	if new_name == source_path.name() {
		return Ok(source_path.clone());
	}

	let parent_path = source_path.parent().ok_or(FilesError::OperationNotAllowed)?;
	let parent = ctx
		.resolver
		.resolve_destination_dir(&parent_path.to_string())
		.await?;
	let is_dir = source.metadata().await?.is_dir();

	let claim = ctx
		.claims
		.claim(&parent.real, new_name, CollisionPolicy::Error, is_dir)
		.await?;
	fs::rename(&source.real, &claim.path)
		.await
		.with_path_ctx(&source.real, "renaming entry")?;

	let renamed = parent_path.join(&claim.name)?;
	info!("Renamed {source_path} to {renamed}");
	Ok(renamed)
}
