//! Authenticated caller context
//!
//! Authentication itself happens in front of the core; what arrives here is a
//! session that either carries a user or does not.

use serde::{Deserialize, Serialize};

use crate::common::{FilesError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
	user: Option<User>,
}

impl Session {
	pub fn authenticated(name: impl Into<String>) -> Self {
		Self {
			user: Some(User { name: name.into() }),
		}
	}

	pub fn anonymous() -> Self {
		Self::default()
	}

	pub fn user(&self) -> Option<&User> {
		self.user.as_ref()
	}

	/// Fails with `Unauthorized` when no user is attached
	pub fn require_user(&self) -> Result<&User> {
		self.user.as_ref().ok_or(FilesError::Unauthorized)
	}
}
