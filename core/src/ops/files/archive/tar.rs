//! In-process extraction of tar, tar.gz and tar.xz

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use uf_utils::error::IoResultExt;
use xz2::read::XzDecoder;

use super::ArchiveKind;
use crate::common::{FilesError, Result};

/// Unpack into `destination`; `tar` skips entries that would escape it
pub fn extract(kind: ArchiveKind, archive: &Path, destination: &Path) -> Result<()> {
	let file = BufReader::new(File::open(archive).with_path(archive)?);
	let reader: Box<dyn Read> = match kind {
		ArchiveKind::Tar => Box::new(file),
		ArchiveKind::TarGz => Box::new(GzDecoder::new(file)),
		ArchiveKind::TarXz => Box::new(XzDecoder::new(file)),
		other => {
			return Err(FilesError::Archive(format!(
				"{other} is not a native tar format"
			)))
		}
	};

	let mut tar = tar::Archive::new(reader);
	tar.set_preserve_permissions(true);
	tar.set_preserve_mtime(true);
	tar.set_overwrite(false);
	tar.unpack(destination).with_path_ctx(archive, "unpacking")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use flate2::{write::GzEncoder, Compression};

	#[test]
	fn extracts_gzipped_tar() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir(dir.path().join("src")).unwrap();
		std::fs::write(dir.path().join("src/hello.txt"), "hello").unwrap();

		let archive_path = dir.path().join("bundle.tar.gz");
		{
			let encoder = GzEncoder::new(File::create(&archive_path).unwrap(), Compression::default());
			let mut builder = tar::Builder::new(encoder);
			builder
				.append_dir_all("src", dir.path().join("src"))
				.unwrap();
			builder.into_inner().unwrap().finish().unwrap();
		}

		let out = dir.path().join("out");
		std::fs::create_dir(&out).unwrap();
		extract(ArchiveKind::TarGz, &archive_path, &out).unwrap();
		assert_eq!(
			std::fs::read_to_string(out.join("src/hello.txt")).unwrap(),
			"hello"
		);
	}
}
