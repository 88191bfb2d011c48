use anyhow::{anyhow, Result};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "UMBREL_FILES_DATA_DIR";

/// Platform-specific data directory resolution
pub fn default_data_dir() -> Result<PathBuf> {
	if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
		let dir = PathBuf::from(dir);
		fs::create_dir_all(&dir)?;
		return Ok(dir);
	}

	#[cfg(target_os = "macos")]
	let dir = dirs::data_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("umbrel-files");

	#[cfg(not(target_os = "macos"))]
	let dir = dirs::data_local_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("umbrel-files");

	// Create directory if it doesn't exist
	fs::create_dir_all(&dir)?;

	Ok(dir)
}
