//! Which paths may be mutated, and what each listed entry may do

use crate::common::{FilesError, Result};
use crate::domain::{EntryKind, Operation, Root, VirtualPath};
use crate::ops::files::archive::ArchiveKind;

/// Paths that may never be trashed, deleted, moved, renamed or used as a copy source
pub fn is_protected(path: &VirtualPath) -> bool {
	let depth = path.depth();
	match path.root() {
		_ if depth == 0 => true,
		Root::Apps | Root::External => depth == 1,
		Root::Home => depth == 1 && path.name() == "Downloads",
		Root::Network => depth <= 2,
		Root::Backups | Root::Trash => false,
	}
}

/// Whether new entries may be created directly inside `dir`
pub fn can_create_in(dir: &VirtualPath) -> bool {
	let depth = dir.depth();
	match dir.root() {
		Root::Home => true,
		Root::Apps | Root::External => depth >= 1,
		Root::Network => depth >= 2,
		Root::Backups | Root::Trash => false,
	}
}

/// Inside a mounted network share, below the mount point
pub fn is_network_backed(path: &VirtualPath) -> bool {
	path.root() == Root::Network && path.depth() >= 3
}

/// Directories that may be published as SMB shares
pub fn is_shareable(path: &VirtualPath) -> bool {
	match path.root() {
		Root::Home => true,
		Root::External => path.depth() >= 1,
		_ => false,
	}
}

pub fn ensure_not_protected(path: &VirtualPath) -> Result<()> {
	if is_protected(path) {
		return Err(FilesError::OperationNotAllowed);
	}
	Ok(())
}

pub fn ensure_can_create_in(dir: &VirtualPath) -> Result<()> {
	if !can_create_in(dir) {
		return Err(FilesError::OperationNotAllowed);
	}
	Ok(())
}

/// Operations offered for one listed entry
pub fn allowed_operations(path: &VirtualPath, kind: EntryKind) -> Vec<Operation> {
	let unarchivable = kind == EntryKind::File && ArchiveKind::from_file_name(path.name()).is_some();
	let shareable = kind.is_dir() && is_shareable(path);

	if path.root() == Root::Trash {
		return if path.is_root() {
			vec![]
		} else {
			vec![Operation::Restore, Operation::Delete]
		};
	}

	if path.root() == Root::Backups {
		return if path.is_root() {
			vec![]
		} else {
			vec![Operation::Copy]
		};
	}

	if is_protected(path) {
		return if shareable { vec![Operation::Share] } else { vec![] };
	}

	let mut operations = vec![Operation::Copy, Operation::Move, Operation::Rename];
	if is_network_backed(path) {
		operations.push(Operation::Delete);
	} else {
		operations.push(Operation::Trash);
	}
	operations.push(Operation::Archive);
	if unarchivable {
		operations.push(Operation::Unarchive);
	}
	if shareable {
		operations.push(Operation::Share);
	}
	operations
}
