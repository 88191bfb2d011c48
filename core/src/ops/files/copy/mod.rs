//! Copy and move between virtual directories
//!
//! All preconditions are checked before anything is written. Multi-item
//! callers are fail-fast: entries already transferred stay where they are.

pub mod size;
pub mod strategy;

use std::sync::Arc;

use tracing::{info, instrument};

use self::size::tree_size;
use self::strategy::{CopyStrategy, LocalMoveStrategy, PreservingCopyStrategy, ProgressCallback};
use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::{CollisionPolicy, Root, VirtualPath};
use crate::infra::event::{FileOperation, ProgressReporter};
use crate::ops::files::{protection, unique_name::remove_entry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
	Copy,
	Move,
}

impl TransferMode {
	fn operation(self) -> FileOperation {
		match self {
			Self::Copy => FileOperation::Copy,
			Self::Move => FileOperation::Move,
		}
	}
}

/// Copy `path` into `to_directory`, returning the new virtual path
pub async fn copy(
	ctx: &CoreContext,
	path: &str,
	to_directory: &str,
	collision: CollisionPolicy,
) -> Result<VirtualPath> {
	transfer(ctx, TransferMode::Copy, path, to_directory, collision).await
}

/// Move `path` into `to_directory`, returning the new virtual path
pub async fn move_entry(
	ctx: &CoreContext,
	path: &str,
	to_directory: &str,
	collision: CollisionPolicy,
) -> Result<VirtualPath> {
	transfer(ctx, TransferMode::Move, path, to_directory, collision).await
}

#[instrument(skip(ctx), err)]
async fn transfer(
	ctx: &CoreContext,
	mode: TransferMode,
	path: &str,
	to_directory: &str,
	collision: CollisionPolicy,
) -> Result<VirtualPath> {
	let source = match mode {
		TransferMode::Copy => ctx.resolver.resolve_source(path).await?,
		TransferMode::Move => ctx.resolver.resolve_entry_source(path).await?,
	};
	let destination_dir = ctx.resolver.resolve_destination_dir(to_directory).await?;
	let source_path = &source.virtual_path;

	match (source_path.root(), mode) {
		(Root::Trash, _) | (Root::Backups, TransferMode::Move) => {
			return Err(FilesError::OperationNotAllowed)
		}
		_ => {}
	}
	protection::ensure_not_protected(source_path)?;
	protection::ensure_can_create_in(&destination_dir.virtual_path)?;

	// Compare the entry itself, not the target of a final symlink
	let source_parent = source
		.canonical_parent()
		.await?
		.ok_or(FilesError::OperationNotAllowed)?;
	let source_self = source_parent.join(source_path.name());
	if destination_dir.canonical.starts_with(&source_self) {
		return Err(FilesError::SubdirOfSelf);
	}

	let same_directory = source_parent == destination_dir.canonical;
	if same_directory && mode == TransferMode::Move {
		return Ok(source_path.clone());
	}
	let policy = if same_directory {
		CollisionPolicy::KeepBoth
	} else {
		collision
	};

	let is_dir = source.metadata().await?.is_dir();
	if mode == TransferMode::Copy {
		let needed = tree_size(&source.real).await?;
		let usage = ctx.disk_usage.usage(&destination_dir.real).await?;
		if needed > usage.available {
			return Err(FilesError::NotEnoughSpace);
		}
	}

	let claim = ctx
		.claims
		.claim(&destination_dir.real, source_path.name(), policy, is_dir)
		.await?;
	if claim.replaces_existing {
		if source_self.starts_with(destination_dir.canonical.join(&claim.name)) {
			return Err(FilesError::OperationNotAllowed);
		}
		remove_entry(&claim.path).await?;
	}

	let reporter = ProgressReporter::new(&ctx.events, mode.operation());
	let callback: ProgressCallback = {
		let reporter = reporter.clone();
		Arc::new(move |done, total| reporter.progress(done, total))
	};

	let bytes = match mode {
		TransferMode::Copy => {
			PreservingCopyStrategy
				.execute(&source.real, &claim.path, Some(callback))
				.await?
		}
		TransferMode::Move => {
			LocalMoveStrategy
				.execute(&source.real, &claim.path, Some(callback))
				.await?
		}
	};

	let final_path = destination_dir.virtual_path.join(&claim.name)?;
	reporter.completed(&final_path);
	info!("{mode:?} {source_path} -> {final_path} ({bytes} bytes)");
	Ok(final_path)
}
