use std::path::Path;

use uf_utils::error::FileIOError;
use walkdir::WalkDir;

use crate::common::Result;

/// Total bytes under `path`, counting links as links and directories as zero
pub async fn tree_size(path: &Path) -> Result<u64> {
	let path = path.to_path_buf();
	let size = tokio::task::spawn_blocking(move || {
		WalkDir::new(&path)
			.follow_links(false)
			.into_iter()
			.try_fold(0u64, |total, entry| {
				let entry = entry.map_err(|e| {
					let at = e.path().unwrap_or(&path).to_path_buf();
					FileIOError::from_std_io_err(&at, e.into())
				})?;
				let metadata = entry
					.metadata()
					.map_err(|e| FileIOError::from_std_io_err(entry.path(), e.into()))?;
				Ok::<_, FileIOError>(if metadata.is_dir() {
					total
				} else {
					total + metadata.len()
				})
			})
	})
	.await??;

	Ok(size)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn sums_files_recursively() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir(dir.path().join("sub")).unwrap();
		std::fs::write(dir.path().join("a"), vec![0u8; 10]).unwrap();
		std::fs::write(dir.path().join("sub/b"), vec![0u8; 32]).unwrap();

		assert_eq!(tree_size(dir.path()).await.unwrap(), 42);
		assert_eq!(tree_size(&dir.path().join("a")).await.unwrap(), 10);
	}
}
