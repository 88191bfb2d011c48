//! Entry name validation

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameValidationError {
	#[error("name cannot be empty")]
	Empty,

	#[error("name cannot contain a path separator")]
	ContainsPathSeparator,

	#[error("name cannot be '.' or '..'")]
	InvalidDotName,

	#[error("name cannot contain a NUL byte")]
	ContainsNul,

	#[error("name exceeds maximum length of {0} bytes")]
	TooLong(usize),
}

/// Longest single path component accepted by the host filesystems
const MAX_FILENAME_LENGTH: usize = 255;

/// Validate a single entry name for rename, create and upload
pub fn validate_filename(name: &str) -> Result<(), FilenameValidationError> {
	if name.is_empty() {
		return Err(FilenameValidationError::Empty);
	}

	if name.contains('/') {
		return Err(FilenameValidationError::ContainsPathSeparator);
	}

	if name == "." || name == ".." {
		return Err(FilenameValidationError::InvalidDotName);
	}

	if name.contains('\0') {
		return Err(FilenameValidationError::ContainsNul);
	}

	if name.len() > MAX_FILENAME_LENGTH {
		return Err(FilenameValidationError::TooLong(MAX_FILENAME_LENGTH));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_valid_filenames() {
		assert!(validate_filename("file.txt").is_ok());
		assert!(validate_filename("my document.pdf").is_ok());
		assert!(validate_filename(".hidden").is_ok());
		assert!(validate_filename("what? \"quoted\" *").is_ok());
		assert!(validate_filename("日本語ファイル.txt").is_ok());
	}

	#[test]
	fn test_rejected_filenames() {
		assert_eq!(validate_filename(""), Err(FilenameValidationError::Empty));
		assert_eq!(
			validate_filename("path/to/file"),
			Err(FilenameValidationError::ContainsPathSeparator)
		);
		assert_eq!(validate_filename("."), Err(FilenameValidationError::InvalidDotName));
		assert_eq!(validate_filename(".."), Err(FilenameValidationError::InvalidDotName));
		assert_eq!(validate_filename("a\0b"), Err(FilenameValidationError::ContainsNul));
	}

	#[test]
	fn test_max_length_counts_bytes() {
		assert!(validate_filename(&"a".repeat(255)).is_ok());
		assert_eq!(
			validate_filename(&"a".repeat(256)),
			Err(FilenameValidationError::TooLong(255))
		);
		// 256 bytes in 128 characters
		assert!(validate_filename(&"é".repeat(128)).is_err());
	}
}
