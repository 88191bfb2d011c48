use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Normalized filesystem change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsEvent {
	pub kind: FsEventKind,
	/// Path the event applies to. For renames this is the new location.
	pub path: PathBuf,
	pub timestamp: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsEventKind {
	Create,
	Modify,
	Remove,
	Rename { from: PathBuf },
}

impl FsEventKind {
	pub fn is_create(&self) -> bool {
		matches!(self, Self::Create)
	}

	pub fn is_modify(&self) -> bool {
		matches!(self, Self::Modify)
	}

	pub fn is_remove(&self) -> bool {
		matches!(self, Self::Remove)
	}

	pub fn is_rename(&self) -> bool {
		matches!(self, Self::Rename { .. })
	}
}

impl FsEvent {
	fn new(kind: FsEventKind, path: PathBuf) -> Self {
		Self {
			kind,
			path,
			timestamp: SystemTime::now(),
		}
	}

	pub fn create(path: PathBuf) -> Self {
		Self::new(FsEventKind::Create, path)
	}

	pub fn modify(path: PathBuf) -> Self {
		Self::new(FsEventKind::Modify, path)
	}

	pub fn remove(path: PathBuf) -> Self {
		Self::new(FsEventKind::Remove, path)
	}

	pub fn rename(from: PathBuf, to: PathBuf) -> Self {
		Self::new(FsEventKind::Rename { from }, to)
	}

	/// The path that no longer exists after this event, if any
	pub fn vanished_path(&self) -> Option<&Path> {
		match &self.kind {
			FsEventKind::Remove => Some(&self.path),
			FsEventKind::Rename { from } => Some(from),
			FsEventKind::Create | FsEventKind::Modify => None,
		}
	}
}

/// Raw event kinds as reported by the notify backend, before platform handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEventKind {
	Create,
	Modify,
	Remove,
	/// First half of a rename; the second half carries the same tracker
	RenameFrom,
	RenameTo,
	/// Rename reported with both paths at once
	Rename,
	Other(String),
}

#[derive(Debug, Clone)]
pub struct RawNotifyEvent {
	pub kind: RawEventKind,
	pub paths: Vec<PathBuf>,
	pub tracker: Option<usize>,
	pub timestamp: SystemTime,
}

impl RawNotifyEvent {
	pub fn primary_path(&self) -> Option<&PathBuf> {
		self.paths.first()
	}
}

impl From<notify::Event> for RawNotifyEvent {
	fn from(event: notify::Event) -> Self {
		let kind = match event.kind {
			EventKind::Create(_) => RawEventKind::Create,
			EventKind::Remove(_) => RawEventKind::Remove,
			EventKind::Modify(ModifyKind::Name(RenameMode::From)) => RawEventKind::RenameFrom,
			EventKind::Modify(ModifyKind::Name(RenameMode::To)) => RawEventKind::RenameTo,
			EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => RawEventKind::Rename,
			EventKind::Modify(_) => RawEventKind::Modify,
			other => RawEventKind::Other(format!("{other:?}")),
		};

		Self {
			kind,
			tracker: event.attrs.tracker(),
			paths: event.paths,
			timestamp: SystemTime::now(),
		}
	}
}
