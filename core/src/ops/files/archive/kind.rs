use std::fmt;

/// Archive formats that can be extracted, resolved once from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
	Zip,
	Tar,
	TarGz,
	TarBz2,
	TarXz,
	SevenZip,
	Rar,
}

/// Longest suffixes first so `.tar.gz` wins over `.gz`-less `.tar` checks
const SUFFIXES: &[(&str, ArchiveKind)] = &[
	(".tar.gz", ArchiveKind::TarGz),
	(".tar.bz2", ArchiveKind::TarBz2),
	(".tar.xz", ArchiveKind::TarXz),
	(".tgz", ArchiveKind::TarGz),
	(".tbz2", ArchiveKind::TarBz2),
	(".txz", ArchiveKind::TarXz),
	(".tar", ArchiveKind::Tar),
	(".zip", ArchiveKind::Zip),
	(".7z", ArchiveKind::SevenZip),
	(".rar", ArchiveKind::Rar),
];

impl ArchiveKind {
	pub fn from_file_name(name: &str) -> Option<Self> {
		Self::split(name).map(|(_, kind)| kind)
	}

	/// Name without the archive extension, plus the detected kind
	pub fn split(name: &str) -> Option<(&str, Self)> {
		let lower = name.to_ascii_lowercase();
		SUFFIXES.iter().find_map(|(suffix, kind)| {
			let stem_len = name.len().checked_sub(suffix.len())?;
			(lower.ends_with(suffix) && stem_len > 0).then(|| (&name[..stem_len], *kind))
		})
	}

	/// Whether extraction runs in-process rather than through an external tool
	pub fn is_native(self) -> bool {
		matches!(self, Self::Zip | Self::Tar | Self::TarGz | Self::TarXz)
	}
}

impl fmt::Display for ArchiveKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Zip => "zip",
			Self::Tar => "tar",
			Self::TarGz => "tar.gz",
			Self::TarBz2 => "tar.bz2",
			Self::TarXz => "tar.xz",
			Self::SevenZip => "7z",
			Self::Rar => "rar",
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_compound_extensions() {
		assert_eq!(
			ArchiveKind::split("backup.tar.gz"),
			Some(("backup", ArchiveKind::TarGz))
		);
		assert_eq!(ArchiveKind::split("Photos.ZIP"), Some(("Photos", ArchiveKind::Zip)));
		assert_eq!(ArchiveKind::split("x.tgz"), Some(("x", ArchiveKind::TarGz)));
		assert_eq!(ArchiveKind::split("logs.tar.bz2"), Some(("logs", ArchiveKind::TarBz2)));
		assert_eq!(ArchiveKind::split("set.7z"), Some(("set", ArchiveKind::SevenZip)));
		assert_eq!(ArchiveKind::from_file_name("notes.txt"), None);
		assert_eq!(ArchiveKind::from_file_name(".zip"), None);
		assert_eq!(ArchiveKind::from_file_name("file.gz"), None);
	}
}
