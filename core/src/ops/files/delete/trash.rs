use tracing::{error, info, instrument};
use uf_utils::now_millis;

use super::{write_metadata, TrashMetadata};
use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{CollisionPolicy, Root, VirtualPath};
use crate::infra::event::{FileOperation, ProgressReporter};
use crate::ops::files::copy::strategy::{CopyStrategy, LocalMoveStrategy};
use crate::ops::files::protection;

/// Move an item into the trash, returning its path there
#[instrument(skip(ctx), err)]
pub async fn trash(ctx: &CoreContext, path: &str) -> Result<VirtualPath> {
	let source = ctx.resolver.resolve_entry_source(path).await?;
	let original = source.virtual_path.clone();

	if matches!(original.root(), Root::Trash | Root::Backups)
		|| protection::is_network_backed(&original)
	{
		return Err(FilesError::OperationNotAllowed);
	}
	protection::ensure_not_protected(&original)?;

	let trash_root = VirtualPath::from_root(Root::Trash);
	let trash_dir = ctx.resolver.resolve_virtual(&trash_root, true).await?;
	let is_dir = source.metadata().await?.is_dir();

	// Held until the sidecar is written
	let claim = ctx
		.claims
		.claim(&trash_dir.real, original.name(), CollisionPolicy::KeepBoth, is_dir)
		.await?;

	LocalMoveStrategy
		.execute(&source.real, &claim.path, None)
		.await?;

	let metadata = TrashMetadata {
		path: original.clone(),
		deleted_at: now_millis(),
	};
	if let Err(e) = write_metadata(ctx, &claim.name, &metadata).await {
		error!("Failed to write trash metadata for {original}, moving it back: {e}");
		if let Err(rollback) = LocalMoveStrategy
			.execute(&claim.path, &source.real, None)
			.await
		{
			error!("Failed to move {original} back out of the trash: {rollback}");
		}
		return Err(e);
	}

	let trashed = trash_root.join(&claim.name)?;
	ProgressReporter::new(&ctx.events, FileOperation::Trash).completed(&trashed);
	info!("Trashed {original} as {trashed}");
	Ok(trashed)
}
