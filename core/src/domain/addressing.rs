//! Virtual path addressing
//!
//! Every path a caller hands in is virtual: it starts with one of the fixed
//! roots (`/Home`, `/Apps`, ...) and never contains `.` or `..` segments.
//! Mapping onto the host filesystem happens in the path resolver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::common::FilesError;

/// Top level directories of the virtual namespace
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	Display,
	EnumString,
	EnumIter,
	AsRefStr,
	Serialize,
	Deserialize,
)]
pub enum Root {
	Home,
	Apps,
	Backups,
	External,
	Network,
	Trash,
}

/// A validated, normalized virtual path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VirtualPath {
	root: Root,
	segments: Vec<String>,
}

impl VirtualPath {
	pub fn parse(input: &str) -> Result<Self, FilesError> {
		if input.trim().is_empty() || !input.starts_with('/') || input.contains('\0') {
			return Err(FilesError::PathNotAbsolute);
		}

		let mut parts = input.split('/').filter(|part| !part.is_empty());

		let root = parts.next().ok_or(FilesError::InvalidBase)?;
		if root == "." || root == ".." {
			return Err(FilesError::PathNotAbsolute);
		}
		let root = Root::from_str(root).map_err(|_| FilesError::InvalidBase)?;

		let segments = parts
			.map(|part| match part {
				"." | ".." => Err(FilesError::PathNotAbsolute),
				part => Ok(part.to_string()),
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self { root, segments })
	}

	pub fn from_root(root: Root) -> Self {
		Self {
			root,
			segments: vec![],
		}
	}

	pub fn root(&self) -> Root {
		self.root
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	/// Number of segments below the root; `/Home` is 0, `/Home/a` is 1
	pub fn depth(&self) -> usize {
		self.segments.len()
	}

	pub fn is_root(&self) -> bool {
		self.segments.is_empty()
	}

	/// Last segment, or the root name for a root path
	pub fn name(&self) -> &str {
		self.segments
			.last()
			.map(String::as_str)
			.unwrap_or_else(|| self.root.as_ref())
	}

	pub fn parent(&self) -> Option<Self> {
		if self.is_root() {
			return None;
		}
		Some(Self {
			root: self.root,
			segments: self.segments[..self.segments.len() - 1].to_vec(),
		})
	}

	/// Append a single path segment
	pub fn join(&self, name: &str) -> Result<Self, FilesError> {
		if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
			return Err(FilesError::invalid_input("name", format!("'{name}' is not a valid name")));
		}
		let mut segments = self.segments.clone();
		segments.push(name.to_string());
		Ok(Self {
			root: self.root,
			segments,
		})
	}

	/// Append already validated segments
	pub fn join_segments<'a>(&self, tail: impl IntoIterator<Item = &'a String>) -> Self {
		let mut segments = self.segments.clone();
		segments.extend(tail.into_iter().cloned());
		Self {
			root: self.root,
			segments,
		}
	}

	pub fn with_name(&self, name: &str) -> Result<Self, FilesError> {
		match self.parent() {
			Some(parent) => parent.join(name),
			None => Err(FilesError::OperationNotAllowed),
		}
	}

	/// True when `self` equals `other` or lies beneath it
	pub fn starts_with(&self, other: &VirtualPath) -> bool {
		self.root == other.root
			&& self.segments.len() >= other.segments.len()
			&& self.segments[..other.segments.len()] == other.segments[..]
	}
}

impl fmt::Display for VirtualPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "/{}", self.root)?;
		for segment in &self.segments {
			write!(f, "/{segment}")?;
		}
		Ok(())
	}
}

impl FromStr for VirtualPath {
	type Err = FilesError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl TryFrom<String> for VirtualPath {
	type Error = FilesError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl From<VirtualPath> for String {
	fn from(value: VirtualPath) -> Self {
		value.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn normalizes_slashes() {
		assert_eq!(
			VirtualPath::parse("/Home//Documents/").unwrap().to_string(),
			"/Home/Documents"
		);
		assert_eq!(VirtualPath::parse("/Trash").unwrap().depth(), 0);
	}

	#[test]
	fn rejects_relative_and_dot_segments() {
		for input in ["", "   ", "Home/a", "/Home/../etc", "/Home/./a", "/..", "/Home/a\0b"] {
			assert!(
				matches!(VirtualPath::parse(input), Err(FilesError::PathNotAbsolute)),
				"{input:?}"
			);
		}
	}

	#[test]
	fn rejects_unknown_roots() {
		for input in ["/", "//", "/home", "/Documents/a", "/etc/passwd"] {
			assert!(
				matches!(VirtualPath::parse(input), Err(FilesError::InvalidBase)),
				"{input:?}"
			);
		}
	}

	#[test]
	fn parent_join_and_prefix() {
		let path = VirtualPath::parse("/Home/Documents/report.pdf").unwrap();
		let parent = path.parent().unwrap();
		assert_eq!(parent.to_string(), "/Home/Documents");
		assert_eq!(path.name(), "report.pdf");
		assert!(path.starts_with(&parent));
		assert!(!parent.starts_with(&path));
		assert!(!VirtualPath::parse("/Home/Documents2")
			.unwrap()
			.starts_with(&parent));
		assert_eq!(
			parent.join("notes.txt").unwrap().to_string(),
			"/Home/Documents/notes.txt"
		);
		assert!(parent.join("../x").is_err());
		assert_eq!(VirtualPath::from_root(Root::Home).name(), "Home");
	}

	#[test]
	fn serde_uses_string_form() {
		let path = VirtualPath::parse("/External/usb/photos").unwrap();
		let json = serde_json::to_string(&path).unwrap();
		assert_eq!(json, "\"/External/usb/photos\"");
		let back: VirtualPath = serde_json::from_str(&json).unwrap();
		assert_eq!(back, path);
		assert!(serde_json::from_str::<VirtualPath>("\"/Home/../x\"").is_err());
	}
}
