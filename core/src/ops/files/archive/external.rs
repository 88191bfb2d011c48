//! Extraction through system tools for formats without an in-process decoder

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use super::ArchiveKind;
use crate::common::{FilesError, Result};

fn command_for(kind: ArchiveKind, archive: &Path, destination: &Path) -> Option<Command> {
	let mut command = match kind {
		ArchiveKind::TarBz2 => {
			let mut command = Command::new("tar");
			command.arg("-xjf").arg(archive).arg("-C").arg(destination);
			command
		}
		ArchiveKind::SevenZip => {
			let mut command = Command::new("7z");
			command
				.arg("x")
				.arg(archive)
				.arg(format!("-o{}", destination.display()))
				.arg("-y");
			command
		}
		ArchiveKind::Rar => {
			let mut command = Command::new("unrar");
			command
				.arg("x")
				.arg("-o-")
				.arg(archive)
				.arg(format!("{}/", destination.display()));
			command
		}
		ArchiveKind::Zip | ArchiveKind::Tar | ArchiveKind::TarGz | ArchiveKind::TarXz => {
			return None
		}
	};
	command.kill_on_drop(true);
	Some(command)
}

pub async fn extract(kind: ArchiveKind, archive: &Path, destination: &Path) -> Result<()> {
	let mut command = command_for(kind, archive, destination)
		.ok_or_else(|| FilesError::Archive(format!("{kind} is extracted in-process")))?;
	let program = command.as_std().get_program().to_string_lossy().into_owned();
	debug!("Extracting {} with {program}", archive.display());

	let output = command
		.output()
		.await
		.map_err(|e| FilesError::command(&program, e.to_string()))?;
	if !output.status.success() {
		return Err(FilesError::command(
			program,
			String::from_utf8_lossy(&output.stderr).trim().to_string(),
		));
	}
	Ok(())
}
