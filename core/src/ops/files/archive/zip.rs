//! Zip creation and extraction, run on the blocking pool

use std::fs::File;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use uf_utils::error::{FileIOError, IoResultExt};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::common::{FilesError, Result};

fn zip_error(path: &Path, e: zip::result::ZipError) -> FilesError {
	match e {
		zip::result::ZipError::Io(source) => FileIOError::from_std_io_err(path, source).into(),
		other => FilesError::Archive(format!("{}: {other}", path.display())),
	}
}

/// Write `inputs` into a new zip at `destination`, storing entry names relative
/// to `base`. The inputs themselves get no directory entry, so an empty
/// directory produces an archive with no entries.
pub fn create(base: &Path, inputs: &[PathBuf], destination: &Path) -> Result<u64> {
	let file = File::options()
		.write(true)
		.create_new(true)
		.open(destination)
		.with_path(destination)?;
	let mut writer = ZipWriter::new(file);
	let mut entries = 0;

	for input in inputs {
		for entry in WalkDir::new(input).follow_links(false).sort_by_file_name() {
			let entry = entry.map_err(|e| {
				let at = e.path().unwrap_or(input).to_path_buf();
				FileIOError::from_std_io_err(&at, io::Error::from(e))
			})?;
			if entry.depth() == 0 && entry.file_type().is_dir() {
				continue;
			}

			let path = entry.path();
			let name = path
				.strip_prefix(base)
				.map_err(|_| FilesError::PathsNotInSameDirectory)?
				.to_string_lossy()
				.into_owned();
			let metadata = std::fs::symlink_metadata(path).with_path(path)?;
			let options = SimpleFileOptions::default()
				.compression_method(CompressionMethod::Deflated)
				.unix_permissions(metadata.permissions().mode() & 0o7777);

			if metadata.file_type().is_symlink() {
				let target = std::fs::read_link(path).with_path(path)?;
				writer
					.add_symlink(name, target.to_string_lossy(), options)
					.map_err(|e| zip_error(destination, e))?;
			} else if metadata.is_dir() {
				writer
					.add_directory(format!("{name}/"), options)
					.map_err(|e| zip_error(destination, e))?;
			} else {
				writer
					.start_file(name, options)
					.map_err(|e| zip_error(destination, e))?;
				let mut source = File::open(path).with_path(path)?;
				io::copy(&mut source, &mut writer).with_path(path)?;
			}
			entries += 1;
		}
	}

	writer.finish().map_err(|e| zip_error(destination, e))?;
	Ok(entries)
}

/// Extract into `destination`; entries that would land outside it are refused
pub fn extract(archive: &Path, destination: &Path) -> Result<()> {
	let file = File::open(archive).with_path(archive)?;
	let mut zip = ZipArchive::new(file).map_err(|e| zip_error(archive, e))?;
	zip.extract(destination).map_err(|e| zip_error(archive, e))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_directory_yields_no_entries() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir(dir.path().join("empty")).unwrap();

		let target = dir.path().join("empty.zip");
		let entries = create(dir.path(), &[dir.path().join("empty")], &target).unwrap();
		assert_eq!(entries, 0);
		let zip = ZipArchive::new(File::open(&target).unwrap()).unwrap();
		assert_eq!(zip.len(), 0);
	}

	#[test]
	fn stores_names_relative_to_base() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir_all(dir.path().join("docs/inner")).unwrap();
		std::fs::write(dir.path().join("docs/inner/a.txt"), "a").unwrap();
		std::fs::write(dir.path().join("b.txt"), "b").unwrap();

		let target = dir.path().join("out.zip");
		create(
			dir.path(),
			&[dir.path().join("docs"), dir.path().join("b.txt")],
			&target,
		)
		.unwrap();

		let zip = ZipArchive::new(File::open(&target).unwrap()).unwrap();
		let mut names = zip.file_names().map(str::to_string).collect::<Vec<_>>();
		names.sort();
		assert_eq!(names, vec!["b.txt", "docs/inner/", "docs/inner/a.txt"]);
	}
}
