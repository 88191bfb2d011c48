use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::VirtualPath;

/// Type reported for directories in listings
pub const DIRECTORY_TYPE: &str = "directory";
/// Type reported for symbolic links in listings
pub const SYMLINK_TYPE: &str = "symbolic-link";

/// One entry of a directory listing, computed fresh on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
	pub name: String,
	pub path: VirtualPath,
	/// `directory`, `symbolic-link` or a mime type
	#[serde(rename = "type")]
	pub kind: String,
	/// Bytes; zero for directories and links
	pub size: u64,
	/// Milliseconds since the unix epoch
	pub modified: i64,
	pub operations: Vec<Operation>,
}

impl FileEntry {
	pub fn is_directory(&self) -> bool {
		self.kind == DIRECTORY_TYPE
	}
}

/// What kind of filesystem object an entry is, without following links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
	Directory,
	Symlink,
	File,
}

impl EntryKind {
	pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
		let file_type = metadata.file_type();
		if file_type.is_symlink() {
			Self::Symlink
		} else if file_type.is_dir() {
			Self::Directory
		} else {
			Self::File
		}
	}

	pub fn is_dir(self) -> bool {
		matches!(self, Self::Directory)
	}
}

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
	Copy,
	Move,
	Rename,
	Trash,
	Restore,
	Delete,
	Archive,
	Unarchive,
	Share,
}

/// What to do when the destination name is already taken
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CollisionPolicy {
	#[default]
	Error,
	/// Delete the existing entry wholesale, then write
	Replace,
	/// Pick the next free `name (N).ext`
	KeepBoth,
}
