//! Zip creation and multi-format extraction

mod external;
mod kind;
mod tar;
mod zip;

pub use kind::ArchiveKind;

use std::path::PathBuf;

use tokio::fs;
use tracing::{info, instrument, warn};
use uf_utils::error::IoResultExt;

use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{CollisionPolicy, Root, VirtualPath};
use crate::infra::event::{FileOperation, ProgressReporter};
use crate::ops::files::{protection, unique_name::remove_entry};

/// Name used when several items go into one archive
const MULTI_ITEM_ARCHIVE_NAME: &str = "Archive.zip";

fn ensure_archivable(path: &VirtualPath) -> Result<()> {
	if matches!(path.root(), Root::Trash | Root::Backups) {
		return Err(FilesError::OperationNotAllowed);
	}
	protection::ensure_not_protected(path)
}

/// Zip `paths`, which must share one parent, into that parent
#[instrument(skip(ctx), err)]
pub async fn archive(ctx: &CoreContext, paths: &[String]) -> Result<VirtualPath> {
	let (first, rest) = paths
		.split_first()
		.ok_or_else(|| FilesError::invalid_input("paths", "at least one path is required"))?;

	let first = ctx.resolver.resolve_source(first).await?;
	let parent_path = first
		.virtual_path
		.parent()
		.ok_or(FilesError::OperationNotAllowed)?;

	let mut sources = vec![first];
	for path in rest {
		let source = ctx.resolver.resolve_source(path).await?;
		if source.virtual_path.parent().as_ref() != Some(&parent_path) {
			return Err(FilesError::PathsNotInSameDirectory);
		}
		sources.push(source);
	}
	for source in &sources {
		ensure_archivable(&source.virtual_path)?;
	}

	protection::ensure_can_create_in(&parent_path)?;
	let parent = ctx
		.resolver
		.resolve_destination_dir(&parent_path.to_string())
		.await?;

	let desired = match sources.as_slice() {
		[single] => format!("{}.zip", single.virtual_path.name()),
		_ => MULTI_ITEM_ARCHIVE_NAME.to_string(),
	};
	let claim = ctx
		.claims
		.claim(&parent.real, &desired, CollisionPolicy::KeepBoth, false)
		.await?;

	let base = parent.real.clone();
	let inputs = sources.into_iter().map(|s| s.real).collect::<Vec<PathBuf>>();
	let destination = claim.path.clone();
	let created = tokio::task::spawn_blocking(move || zip::create(&base, &inputs, &destination))
		.await
		.map_err(FilesError::from)
		.and_then(|result| result);

	let entries = match created {
		Ok(entries) => entries,
		Err(e) => {
			discard_partial_output(&claim.path).await;
			return Err(e);
		}
	};

	let archive_path = parent_path.join(&claim.name)?;
	ProgressReporter::new(&ctx.events, FileOperation::Archive).completed(&archive_path);
	info!("Created {archive_path} with {entries} entries");
	Ok(archive_path)
}

/// Extract an archive next to itself into a directory named after it
#[instrument(skip(ctx), err)]
pub async fn unarchive(ctx: &CoreContext, path: &str) -> Result<VirtualPath> {
	let source = ctx.resolver.resolve_source(path).await?;
	let source_path = &source.virtual_path;
	ensure_archivable(source_path)?;
	if !source.metadata().await?.is_file() {
		return Err(FilesError::OperationNotAllowed);
	}

	let (stem, kind) =
		ArchiveKind::split(source_path.name()).ok_or(FilesError::OperationNotAllowed)?;

	let parent_path = source_path.parent().ok_or(FilesError::OperationNotAllowed)?;
	protection::ensure_can_create_in(&parent_path)?;
	let parent = ctx
		.resolver
		.resolve_destination_dir(&parent_path.to_string())
		.await?;

	let claim = ctx
		.claims
		.claim(&parent.real, stem, CollisionPolicy::KeepBoth, true)
		.await?;
	fs::create_dir(&claim.path).await.with_path(&claim.path)?;

	let extracted = if kind.is_native() {
		let archive = source.real.clone();
		let destination = claim.path.clone();
		tokio::task::spawn_blocking(move || match kind {
			ArchiveKind::Zip => zip::extract(&archive, &destination),
			other => tar::extract(other, &archive, &destination),
		})
		.await
		.map_err(FilesError::from)
		.and_then(|result| result)
	} else {
		external::extract(kind, &source.real, &claim.path).await
	};

	if let Err(e) = extracted {
		discard_partial_output(&claim.path).await;
		return Err(e);
	}

	let extracted_path = parent_path.join(&claim.name)?;
	ProgressReporter::new(&ctx.events, FileOperation::Unarchive).completed(&extracted_path);
	info!("Extracted {source_path} ({kind}) into {extracted_path}");
	Ok(extracted_path)
}

async fn discard_partial_output(path: &std::path::Path) {
	if let Err(e) = remove_entry(path).await {
		warn!("Failed to remove partial archive output {}: {e}", path.display());
	}
}
