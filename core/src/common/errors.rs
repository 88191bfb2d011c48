//! Unified error handling for the core
//!
//! Every failure a caller can act on carries a stable bracketed code, e.g.
//! `[escapes-base]`, which transports map onto their own status codes via
//! [`FilesError::status`].

use std::io;

use thiserror::Error;
use uf_utils::error::FileIOError;

use crate::ops::files::rename::validation::FilenameValidationError;

pub type Result<T> = std::result::Result<T, FilesError>;

#[derive(Error, Debug)]
pub enum FilesError {
	#[error("[path-not-absolute]")]
	PathNotAbsolute,

	#[error("[invalid-base]")]
	InvalidBase,

	#[error("[escapes-base]")]
	EscapesBase,

	#[error("[does-not-exist]")]
	DoesNotExist,

	#[error("[source-not-exists]")]
	SourceNotExists,

	#[error("[destination-not-exist]")]
	DestinationNotExist,

	#[error("[subdir-of-self]")]
	SubdirOfSelf,

	#[error("[destination-already-exists]")]
	DestinationAlreadyExists,

	#[error("[unique-name-index-exceeded]")]
	UniqueNameIndexExceeded,

	#[error("[not-enough-space]")]
	NotEnoughSpace,

	#[error("[operation-not-allowed]")]
	OperationNotAllowed,

	#[error("[trash-meta-not-exists]")]
	TrashMetaNotExists,

	#[error("[network-share-already-exists]")]
	NetworkShareAlreadyExists,

	#[error("[network-share-not-exists]")]
	NetworkShareNotExists,

	#[error("unauthorized")]
	Unauthorized,

	#[error("invalid {field}: {message}")]
	InvalidInput {
		field: &'static str,
		message: String,
	},

	#[error("paths must be in same directory")]
	PathsNotInSameDirectory,

	#[error("invalid name: {0}")]
	InvalidName(#[from] FilenameValidationError),

	#[error("error writing file")]
	WriteFailed(#[source] io::Error),

	#[error("upload aborted: {0}")]
	UploadAborted(#[source] io::Error),

	#[error(transparent)]
	FileIO(#[from] FileIOError),

	#[error("archive error: {0}")]
	Archive(String),

	#[error("command `{command}` failed: {message}")]
	Command { command: String, message: String },

	#[error("failed to persist state: {0}")]
	Store(String),

	#[error("background task failed: {0}")]
	Join(#[from] tokio::task::JoinError),
}

/// Broad category of a failure, used to pick a transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
	/// Malformed input
	Validation,
	/// Path escape or a protected target
	Security,
	/// Request conflicts with what is on disk
	State,
	Auth,
	/// Unexpected I/O or external tool failure
	Io,
}

impl FilesError {
	pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
		Self::InvalidInput {
			field,
			message: message.into(),
		}
	}

	pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Command {
			command: command.into(),
			message: message.into(),
		}
	}

	/// Stable code without brackets, if this error has one
	pub fn code(&self) -> Option<&'static str> {
		Some(match self {
			Self::PathNotAbsolute => "path-not-absolute",
			Self::InvalidBase => "invalid-base",
			Self::EscapesBase => "escapes-base",
			Self::DoesNotExist => "does-not-exist",
			Self::SourceNotExists => "source-not-exists",
			Self::DestinationNotExist => "destination-not-exist",
			Self::SubdirOfSelf => "subdir-of-self",
			Self::DestinationAlreadyExists => "destination-already-exists",
			Self::UniqueNameIndexExceeded => "unique-name-index-exceeded",
			Self::NotEnoughSpace => "not-enough-space",
			Self::OperationNotAllowed => "operation-not-allowed",
			Self::TrashMetaNotExists => "trash-meta-not-exists",
			Self::NetworkShareAlreadyExists => "network-share-already-exists",
			Self::NetworkShareNotExists => "network-share-not-exists",
			_ => return None,
		})
	}

	pub fn class(&self) -> ErrorClass {
		match self {
			Self::PathNotAbsolute
			| Self::InvalidBase
			| Self::InvalidInput { .. }
			| Self::PathsNotInSameDirectory
			| Self::InvalidName(_) => ErrorClass::Validation,
			Self::EscapesBase | Self::OperationNotAllowed | Self::SubdirOfSelf => {
				ErrorClass::Security
			}
			Self::DoesNotExist
			| Self::SourceNotExists
			| Self::DestinationNotExist
			| Self::DestinationAlreadyExists
			| Self::UniqueNameIndexExceeded
			| Self::NotEnoughSpace
			| Self::TrashMetaNotExists
			| Self::NetworkShareAlreadyExists
			| Self::NetworkShareNotExists
			| Self::UploadAborted(_) => ErrorClass::State,
			Self::Unauthorized => ErrorClass::Auth,
			Self::WriteFailed(_)
			| Self::FileIO(_)
			| Self::Archive(_)
			| Self::Command { .. }
			| Self::Store(_)
			| Self::Join(_) => ErrorClass::Io,
		}
	}

	/// HTTP-style status for transports
	pub fn status(&self) -> u16 {
		match self.class() {
			ErrorClass::Validation | ErrorClass::Security | ErrorClass::State => 400,
			ErrorClass::Auth => 401,
			ErrorClass::Io => 500,
		}
	}

	/// Swap a generic missing-path error for the one naming the operand
	pub fn or_missing(self, replacement: FilesError) -> FilesError {
		match self {
			Self::DoesNotExist => replacement,
			other => other,
		}
	}

	/// Underlying I/O error kind, when the failure came from the filesystem
	pub fn io_kind(&self) -> Option<io::ErrorKind> {
		match self {
			Self::FileIO(e) => Some(e.kind()),
			Self::WriteFailed(e) | Self::UploadAborted(e) => Some(e.kind()),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_are_bracketed_in_display() {
		assert_eq!(FilesError::EscapesBase.to_string(), "[escapes-base]");
		assert_eq!(
			FilesError::DestinationNotExist.to_string(),
			"[destination-not-exist]"
		);
		assert_eq!(FilesError::EscapesBase.code(), Some("escapes-base"));
		assert_eq!(FilesError::PathsNotInSameDirectory.code(), None);
	}

	#[test]
	fn status_follows_class() {
		assert_eq!(FilesError::PathNotAbsolute.status(), 400);
		assert_eq!(FilesError::OperationNotAllowed.status(), 400);
		assert_eq!(FilesError::DestinationAlreadyExists.status(), 400);
		assert_eq!(FilesError::Unauthorized.status(), 401);
		assert_eq!(
			FilesError::WriteFailed(io::Error::from(io::ErrorKind::Other)).status(),
			500
		);
		assert_eq!(
			FilesError::PathsNotInSameDirectory.to_string(),
			"paths must be in same directory"
		);
	}

	#[test]
	fn or_missing_only_rewrites_does_not_exist() {
		assert!(matches!(
			FilesError::DoesNotExist.or_missing(FilesError::SourceNotExists),
			FilesError::SourceNotExists
		));
		assert!(matches!(
			FilesError::EscapesBase.or_missing(FilesError::SourceNotExists),
			FilesError::EscapesBase
		));
	}
}
