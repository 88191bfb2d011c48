//! Directory listing with keyset pagination
//!
//! Entries are produced fresh from the filesystem on every call. At most
//! [`MAX_LISTED_ENTRIES`] are considered; the rest of a huge directory is
//! reported through `truncated_at` instead of being read.

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, instrument, trace};
use uf_utils::{error::IoResultExt, system_time_to_millis};

use super::sorting::{sort_entries, SortBy, SortOrder};
use crate::common::{FilesError, Result};
use crate::context::CoreContext;
use crate::domain::file::{DIRECTORY_TYPE, SYMLINK_TYPE};
use crate::domain::{EntryKind, FileEntry, VirtualPath};
use crate::ops::files::{protection, upload};

pub const MAX_LISTED_ENTRIES: usize = 10_000;
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Files that never show up in listings
const IGNORED_NAMES: &[&str] = &[".DS_Store"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectoryListingInput {
	pub path: String,
	pub sort_by: SortBy,
	pub sort_order: SortOrder,
	/// Page size (default: 100)
	pub limit: Option<usize>,
	/// Name of the last entry of the previous page
	pub last_file: Option<String>,
}

impl DirectoryListingInput {
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			..Default::default()
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListingOutput {
	pub files: Vec<FileEntry>,
	/// Entries considered, after filtering and the cap
	pub total_files: usize,
	pub has_more: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub truncated_at: Option<usize>,
}

fn is_hidden_from_listing(name: &str) -> bool {
	IGNORED_NAMES.contains(&name) || upload::is_upload_temp_name(name)
}

fn entry_type(name: &str, kind: EntryKind) -> String {
	match kind {
		EntryKind::Directory => DIRECTORY_TYPE.to_string(),
		EntryKind::Symlink => SYMLINK_TYPE.to_string(),
		EntryKind::File => mime_guess::from_path(name)
			.first_or_octet_stream()
			.essence_str()
			.to_string(),
	}
}

#[instrument(skip(ctx, input), fields(path = %input.path))]
pub async fn list_directory(
	ctx: &CoreContext,
	input: DirectoryListingInput,
) -> Result<DirectoryListingOutput> {
	let limit = input.limit.unwrap_or(DEFAULT_PAGE_SIZE);
	if limit == 0 {
		return Err(FilesError::invalid_input("limit", "must be at least 1"));
	}

	let dir = ctx.resolver.resolve(&input.path, true).await?;
	if !dir.is_dir().await {
		return Err(FilesError::invalid_input("path", "not a directory"));
	}

	let mut entries = Vec::new();
	let mut truncated_at = None;
	let mut read_dir = fs::read_dir(&dir.real).await.with_path(&dir.real)?;

	while let Some(dir_entry) = read_dir.next_entry().await.with_path(&dir.real)? {
		let Ok(name) = dir_entry.file_name().into_string() else {
			debug!("Skipping entry with non UTF-8 name in {}", dir.real.display());
			continue;
		};
		if is_hidden_from_listing(&name) {
			continue;
		}
		if entries.len() == MAX_LISTED_ENTRIES {
			truncated_at = Some(MAX_LISTED_ENTRIES);
			break;
		}

		// Entries can vanish or be unreadable between readdir and stat
		let metadata = match fs::symlink_metadata(dir_entry.path()).await {
			Ok(metadata) => metadata,
			Err(e) => {
				trace!("Dropping {name} from listing: {e}");
				continue;
			}
		};

		let Ok(path) = dir.virtual_path.join(&name) else {
			continue;
		};
		entries.push(build_entry(name, path, &metadata));
	}

	sort_entries(&mut entries, input.sort_by, input.sort_order);

	let total_files = entries.len();
	let start = input
		.last_file
		.as_deref()
		.and_then(|last| entries.iter().position(|entry| entry.name == last))
		.map(|idx| idx + 1)
		.unwrap_or(0);
	let end = start.saturating_add(limit).min(total_files);
	let has_more = end < total_files;
	let files = entries.drain(start.min(end)..end).collect();

	Ok(DirectoryListingOutput {
		files,
		total_files,
		has_more,
		truncated_at,
	})
}

fn build_entry(name: String, path: VirtualPath, metadata: &std::fs::Metadata) -> FileEntry {
	let kind = EntryKind::from_metadata(metadata);
	FileEntry {
		kind: entry_type(&name, kind),
		size: match kind {
			EntryKind::File => metadata.len(),
			EntryKind::Directory | EntryKind::Symlink => 0,
		},
		modified: metadata
			.modified()
			.map(system_time_to_millis)
			.unwrap_or_default(),
		operations: protection::allowed_operations(&path, kind),
		name,
		path,
	}
}
