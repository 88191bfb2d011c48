use serde::{Deserialize, Serialize};

use super::VirtualPath;

/// Persisted outbound share; the public name is derived on read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
	pub path: VirtualPath,
}

/// Outbound share as exposed over SMB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkShare {
	pub path: VirtualPath,
	pub name: String,
}

/// Persisted inbound share
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkShareRecord {
	pub host: String,
	pub share: String,
	pub username: String,
	pub password: String,
	pub mount_path: VirtualPath,
}

impl std::fmt::Debug for NetworkShareRecord {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NetworkShareRecord")
			.field("host", &self.host)
			.field("share", &self.share)
			.field("username", &self.username)
			.field("mount_path", &self.mount_path)
			.finish_non_exhaustive()
	}
}

/// Inbound share together with its live mount state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkShareStatus {
	pub host: String,
	pub share: String,
	pub username: String,
	pub mount_path: VirtualPath,
	pub is_mounted: bool,
}
