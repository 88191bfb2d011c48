use std::{fmt::Display, io, path::Path};

use thiserror::Error;

/// File I/O error that includes the path that caused the error
#[derive(Error, Debug)]
pub struct FileIOError {
	pub path: Box<Path>,
	#[source]
	pub source: io::Error,
	pub maybe_context: Option<String>,
}

impl Display for FileIOError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"file I/O error{}: {}; path: '{}'",
			self.maybe_context
				.as_ref()
				.map(|ctx| format!(" ({ctx})"))
				.unwrap_or_default(),
			self.source,
			self.path.display()
		)
	}
}

impl FileIOError {
	pub fn from_std_io_err(path: impl AsRef<Path>, source: io::Error) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: None,
		}
	}

	pub fn from_std_io_err_with_msg(
		path: impl AsRef<Path>,
		source: io::Error,
		msg: impl Into<String>,
	) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: Some(msg.into()),
		}
	}

	pub fn kind(&self) -> io::ErrorKind {
		self.source.kind()
	}
}

/// Attach the offending path to an `io::Result`.
pub trait IoResultExt<T> {
	fn with_path(self, path: impl AsRef<Path>) -> Result<T, FileIOError>;

	fn with_path_ctx(self, path: impl AsRef<Path>, msg: &str) -> Result<T, FileIOError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
	fn with_path(self, path: impl AsRef<Path>) -> Result<T, FileIOError> {
		self.map_err(|e| FileIOError::from_std_io_err(path, e))
	}

	fn with_path_ctx(self, path: impl AsRef<Path>, msg: &str) -> Result<T, FileIOError> {
		self.map_err(|e| FileIOError::from_std_io_err_with_msg(path, e, msg))
	}
}
