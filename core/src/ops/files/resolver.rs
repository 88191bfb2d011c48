//! Virtual path to host path resolution
//!
//! A candidate is the root's host directory joined with the virtual segments.
//! Before anything touches it, the deepest existing ancestor (the candidate
//! itself when present, so a final symlink is followed) is canonicalized and
//! must stay inside the canonical root.
//!
//! Operations that act on an entry as a link (trash, restore, delete, move,
//! rename) resolve it with [`PathResolver::resolve_entry`] instead, which checks
//! the link through its parent and only requires a live target to stay inside
//! the managed roots.

use std::io;
use std::path::{Path, PathBuf};

use strum::IntoEnumIterator;
use tokio::fs;
use tracing::{trace, warn};
use uf_utils::error::{FileIOError, IoResultExt};

use crate::common::{FilesError, Result};
use crate::config::RootPaths;
use crate::domain::{Root, VirtualPath};

#[derive(Debug, Clone)]
pub struct ResolvedPath {
	pub virtual_path: VirtualPath,
	/// Lexical host path; links here are operated on as links
	pub real: PathBuf,
	/// Fully symlink-resolved host path, used for containment checks
	pub canonical: PathBuf,
	/// Whether something (possibly a dangling link) exists at `real`
	pub exists: bool,
}

impl ResolvedPath {
	pub async fn metadata(&self) -> Result<std::fs::Metadata> {
		Ok(fs::symlink_metadata(&self.real).await.with_path(&self.real)?)
	}

	pub async fn is_dir(&self) -> bool {
		fs::metadata(&self.real)
			.await
			.map(|m| m.is_dir())
			.unwrap_or(false)
	}

	/// Canonical path of the containing directory, without following a final link
	pub async fn canonical_parent(&self) -> Result<Option<PathBuf>> {
		match self.real.parent() {
			Some(parent) => Ok(Some(fs::canonicalize(parent).await.with_path(parent)?)),
			None => Ok(None),
		}
	}
}

pub struct PathResolver {
	roots: RootPaths,
}

impl PathResolver {
	pub fn new(roots: &RootPaths) -> Self {
		Self {
			roots: roots.clone(),
		}
	}

	/// Configured host directory of a root
	pub fn root_dir(&self, root: Root) -> &Path {
		self.roots.get(root)
	}

	pub fn trash_meta_dir(&self) -> &Path {
		&self.roots.trash_meta
	}

	pub async fn resolve(&self, path: &str, must_exist: bool) -> Result<ResolvedPath> {
		self.resolve_virtual(&VirtualPath::parse(path)?, must_exist)
			.await
	}

	pub async fn resolve_virtual(
		&self,
		virtual_path: &VirtualPath,
		must_exist: bool,
	) -> Result<ResolvedPath> {
		let root_dir = self.root_dir(virtual_path.root());
		let base = fs::canonicalize(root_dir)
			.await
			.with_path_ctx(root_dir, "canonicalizing root")?;

		let mut real = root_dir.to_path_buf();
		real.extend(virtual_path.segments());

		let exists = match fs::symlink_metadata(&real).await {
			Ok(_) => true,
			Err(e) if is_missing(&e) => false,
			Err(e) => return Err(FileIOError::from_std_io_err(&real, e).into()),
		};

		let canonical = canonicalize_existing_prefix(&real).await?;
		if !canonical.starts_with(&base) {
			warn!(
				"Rejected {} resolving outside of its root ({})",
				virtual_path,
				canonical.display()
			);
			return Err(FilesError::EscapesBase);
		}

		if must_exist && !exists {
			return Err(FilesError::DoesNotExist);
		}

		trace!("Resolved {} to {}", virtual_path, real.display());
		Ok(ResolvedPath {
			virtual_path: virtual_path.clone(),
			real,
			canonical,
			exists,
		})
	}

	/// Resolve without following a final symlink
	pub async fn resolve_entry(
		&self,
		virtual_path: &VirtualPath,
		must_exist: bool,
	) -> Result<ResolvedPath> {
		let mut real = self.root_dir(virtual_path.root()).to_path_buf();
		real.extend(virtual_path.segments());

		let is_link = match fs::symlink_metadata(&real).await {
			Ok(metadata) => metadata.file_type().is_symlink(),
			Err(e) if is_missing(&e) => false,
			Err(e) => return Err(FileIOError::from_std_io_err(&real, e).into()),
		};
		if !is_link {
			return self.resolve_virtual(virtual_path, must_exist).await;
		}

		let (Some(parent), Some(name)) = (virtual_path.parent(), real.file_name()) else {
			return Err(FilesError::OperationNotAllowed);
		};
		let name = name.to_os_string();
		let parent = self.resolve_virtual(&parent, true).await?;
		let canonical = parent.canonical.join(name);

		match fs::canonicalize(&real).await {
			Ok(target) if !self.is_inside_roots(&target).await => {
				warn!(
					"Rejected link {} pointing outside of the roots ({})",
					virtual_path,
					target.display()
				);
				return Err(FilesError::EscapesBase);
			}
			Ok(_) => {}
			Err(e) if is_missing(&e) => {}
			Err(e) => return Err(FileIOError::from_std_io_err(&real, e).into()),
		}

		trace!("Resolved link {} to {}", virtual_path, real.display());
		Ok(ResolvedPath {
			virtual_path: virtual_path.clone(),
			real,
			canonical,
			exists: true,
		})
	}

	/// Resolve a path that must exist and is the operand being acted on
	pub async fn resolve_source(&self, path: &str) -> Result<ResolvedPath> {
		self.resolve(path, true)
			.await
			.map_err(|e| e.or_missing(FilesError::SourceNotExists))
	}

	/// Like [`Self::resolve_source`], but a final link is the operand itself
	pub async fn resolve_entry_source(&self, path: &str) -> Result<ResolvedPath> {
		self.resolve_entry(&VirtualPath::parse(path)?, true)
			.await
			.map_err(|e| e.or_missing(FilesError::SourceNotExists))
	}

	async fn is_inside_roots(&self, canonical: &Path) -> bool {
		for root in Root::iter() {
			if let Ok(base) = fs::canonicalize(self.root_dir(root)).await {
				if canonical.starts_with(base) {
					return true;
				}
			}
		}
		false
	}

	/// Resolve an existing directory that receives new entries
	pub async fn resolve_destination_dir(&self, path: &str) -> Result<ResolvedPath> {
		let resolved = self
			.resolve(path, true)
			.await
			.map_err(|e| e.or_missing(FilesError::DestinationNotExist))?;
		if !resolved.is_dir().await {
			return Err(FilesError::DestinationNotExist);
		}
		Ok(resolved)
	}

	/// Map a host path back into the virtual namespace
	pub fn to_virtual(&self, real: &Path) -> Option<VirtualPath> {
		Root::iter().find_map(|root| {
			let rest = real.strip_prefix(self.roots.get(root)).ok()?;
			let mut path = VirtualPath::from_root(root);
			for component in rest.components() {
				path = path.join(component.as_os_str().to_str()?).ok()?;
			}
			Some(path)
		})
	}
}

fn is_missing(e: &io::Error) -> bool {
	matches!(e.kind(), io::ErrorKind::NotFound) || e.raw_os_error() == Some(libc::ENOTDIR)
}

/// Canonicalize the deepest existing ancestor and re-append the missing tail.
///
/// A dangling symlink counts as missing here, so its target is never trusted;
/// the link itself is checked through its parent.
async fn canonicalize_existing_prefix(path: &Path) -> Result<PathBuf> {
	let mut existing = path;
	let mut tail = Vec::new();

	loop {
		match fs::canonicalize(existing).await {
			Ok(mut canonical) => {
				canonical.extend(tail.iter().rev());
				return Ok(canonical);
			}
			Err(e) if is_missing(&e) => {
				let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
					return Err(FileIOError::from_std_io_err(path, e).into());
				};
				tail.push(name.to_os_string());
				existing = parent;
			}
			Err(e) => return Err(FileIOError::from_std_io_err(existing, e).into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::os::unix::fs::symlink;

	fn setup() -> (tempfile::TempDir, PathResolver) {
		let dir = tempfile::tempdir().unwrap();
		let roots = RootPaths::under(dir.path());
		for root in Root::iter() {
			std::fs::create_dir_all(roots.get(root)).unwrap();
		}
		let resolver = PathResolver::new(&roots);
		(dir, resolver)
	}

	#[tokio::test]
	async fn resolves_inside_root() {
		let (dir, resolver) = setup();
		std::fs::write(dir.path().join("home/a.txt"), "a").unwrap();

		let resolved = resolver.resolve("/Home//a.txt", true).await.unwrap();
		assert_eq!(resolved.real, dir.path().join("home/a.txt"));
		assert_eq!(resolved.virtual_path.to_string(), "/Home/a.txt");
		assert!(resolved.exists);

		let missing = resolver.resolve("/Home/new/deeper", false).await.unwrap();
		assert!(!missing.exists);
		assert!(matches!(
			resolver.resolve("/Home/new", true).await,
			Err(FilesError::DoesNotExist)
		));
	}

	#[tokio::test]
	async fn rejects_symlink_escape() {
		let (dir, resolver) = setup();
		let outside = tempfile::tempdir().unwrap();
		std::fs::write(outside.path().join("secret"), "s").unwrap();
		symlink(outside.path(), dir.path().join("home/escape")).unwrap();
		symlink(
			outside.path().join("secret"),
			dir.path().join("home/secret-link"),
		)
		.unwrap();

		for path in ["/Home/escape", "/Home/escape/secret", "/Home/escape/new", "/Home/secret-link"] {
			assert!(
				matches!(resolver.resolve(path, false).await, Err(FilesError::EscapesBase)),
				"{path}"
			);
		}
	}

	#[tokio::test]
	async fn allows_symlinks_within_root() {
		let (dir, resolver) = setup();
		std::fs::create_dir(dir.path().join("home/real")).unwrap();
		symlink(dir.path().join("home/real"), dir.path().join("home/link")).unwrap();

		let resolved = resolver.resolve("/Home/link", true).await.unwrap();
		assert_eq!(resolved.real, dir.path().join("home/link"));
		assert!(resolved.canonical.ends_with("home/real"));
	}

	#[tokio::test]
	async fn dangling_link_is_checked_through_parent() {
		let (dir, resolver) = setup();
		symlink("/definitely/not/here", dir.path().join("home/dangling")).unwrap();

		let resolved = resolver.resolve("/Home/dangling", true).await.unwrap();
		assert!(resolved.exists);
	}

	#[tokio::test]
	async fn entry_resolution_keeps_the_link() {
		let (dir, resolver) = setup();
		std::fs::write(dir.path().join("home/target.txt"), "t").unwrap();
		symlink(
			dir.path().join("home/target.txt"),
			dir.path().join("trash/link"),
		)
		.unwrap();

		let link = VirtualPath::parse("/Trash/link").unwrap();
		assert!(matches!(
			resolver.resolve_virtual(&link, true).await,
			Err(FilesError::EscapesBase)
		));

		let resolved = resolver.resolve_entry(&link, true).await.unwrap();
		assert_eq!(resolved.real, dir.path().join("trash/link"));
		assert!(resolved.canonical.ends_with("trash/link"));
		assert!(resolved.exists);
	}

	#[tokio::test]
	async fn entry_resolution_rejects_links_out_of_the_roots() {
		let (dir, resolver) = setup();
		let outside = tempfile::tempdir().unwrap();
		symlink(outside.path(), dir.path().join("home/escape")).unwrap();

		let link = VirtualPath::parse("/Home/escape").unwrap();
		assert!(matches!(
			resolver.resolve_entry(&link, true).await,
			Err(FilesError::EscapesBase)
		));
		assert!(matches!(
			resolver.resolve_entry_source("/Home/escape/inner").await,
			Err(FilesError::EscapesBase)
		));
	}

	#[tokio::test]
	async fn maps_host_paths_back() {
		let (dir, resolver) = setup();
		let virtual_path = resolver
			.to_virtual(&dir.path().join("home/Documents/a.txt"))
			.unwrap();
		assert_eq!(virtual_path.to_string(), "/Home/Documents/a.txt");
		assert!(resolver.to_virtual(Path::new("/etc/passwd")).is_none());
	}
}
