use tracing::{info, instrument};

use super::{read_metadata, remove_metadata};
use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{CollisionPolicy, Root, VirtualPath};
use crate::infra::event::{FileOperation, ProgressReporter};
use crate::ops::files::copy::strategy::{CopyStrategy, LocalMoveStrategy};
use crate::ops::files::create_folder::create_parent_directories;
use crate::ops::files::unique_name::remove_entry;

/// Move a trashed item (or something inside a trashed directory) back to
/// where it came from
#[instrument(skip(ctx), err)]
pub async fn restore(
	ctx: &CoreContext,
	path: &str,
	collision: CollisionPolicy,
) -> Result<VirtualPath> {
	let trashed = VirtualPath::parse(path)?;
	if trashed.root() != Root::Trash || trashed.is_root() {
		return Err(FilesError::OperationNotAllowed);
	}

	let item = ctx
		.resolver
		.resolve_entry(&trashed, true)
		.await
		.map_err(|e| e.or_missing(FilesError::SourceNotExists))?;

	// Children of a trashed directory share the sidecar of that directory
	let segments = trashed.segments();
	let metadata = read_metadata(ctx, &segments[0]).await?;
	let original = metadata.path.join_segments(&segments[1..]);
	let original_parent = original.parent().ok_or(FilesError::OperationNotAllowed)?;

	// Each missing level must be creatable, so an unplugged drive is not recreated
	let parent = create_parent_directories(ctx, &original_parent).await?;

	let is_dir = item.metadata().await?.is_dir();
	let claim = ctx
		.claims
		.claim(&parent.real, original.name(), collision, is_dir)
		.await?;
	if claim.replaces_existing {
		remove_entry(&claim.path).await?;
	}

	LocalMoveStrategy
		.execute(&item.real, &claim.path, None)
		.await?;

	if trashed.depth() == 1 {
		remove_metadata(ctx, &segments[0]).await?;
	}

	let restored = original_parent.join(&claim.name)?;
	ProgressReporter::new(&ctx.events, FileOperation::Restore).completed(&restored);
	info!("Restored {trashed} to {restored}");
	Ok(restored)
}
