use std::io;

use tokio::fs;
use tracing::{debug, instrument};
use uf_utils::error::{FileIOError, IoResultExt};

use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{CollisionPolicy, VirtualPath};
use crate::ops::files::resolver::ResolvedPath;
use crate::ops::files::{protection, rename::validation::validate_filename};

/// Create a single new directory; the parent must already exist
#[instrument(skip(ctx), err)]
pub async fn create_directory(ctx: &CoreContext, path: &str) -> Result<VirtualPath> {
	let target = VirtualPath::parse(path)?;
	let parent_path = target.parent().ok_or(FilesError::OperationNotAllowed)?;
	validate_filename(target.name())?;
	protection::ensure_can_create_in(&parent_path)?;

	let parent = ctx
		.resolver
		.resolve_destination_dir(&parent_path.to_string())
		.await?;
	let claim = ctx
		.claims
		.claim(&parent.real, target.name(), CollisionPolicy::Error, true)
		.await?;
	fs::create_dir(&claim.path).await.with_path(&claim.path)?;

	debug!("Created directory {target}");
	Ok(target)
}

/// Create every missing directory up to `dir`, checking each creation is allowed
pub async fn create_parent_directories(
	ctx: &CoreContext,
	dir: &VirtualPath,
) -> Result<ResolvedPath> {
	let mut missing = vec![];
	let mut current = dir.clone();
	loop {
		if ctx.resolver.resolve_virtual(&current, false).await?.exists {
			break;
		}
		let parent = current.parent().ok_or(FilesError::DestinationNotExist)?;
		missing.push(current);
		current = parent;
	}

	protection::ensure_can_create_in(&current)?;
	for created in &missing {
		protection::ensure_can_create_in(created)?;
	}

	for created in missing.iter().rev() {
		let resolved = ctx.resolver.resolve_virtual(created, false).await?;
		match fs::create_dir(&resolved.real).await {
			Ok(()) => {}
			Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
			Err(e) => return Err(FileIOError::from_std_io_err(&resolved.real, e).into()),
		}
		debug!("Created missing directory {created}");
	}

	ctx.resolver.resolve_destination_dir(&dir.to_string()).await
}
