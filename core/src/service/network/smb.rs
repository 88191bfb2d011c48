//! SMB client side: CIFS mounts, share listing and reachability

use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::{fs, net::TcpStream, process::Command};
use tracing::{debug, trace};
use uf_utils::error::IoResultExt;

use crate::common::{FilesError, Result};

const SMB_PORT: u16 = 445;
const PROC_MOUNTS: &str = "/proc/mounts";

/// Credentials and location of one remote share
#[derive(Clone, Copy)]
pub struct ShareLocation<'a> {
	pub host: &'a str,
	pub share: &'a str,
	pub username: &'a str,
	pub password: &'a str,
}

#[async_trait]
pub trait SmbClient: Send + Sync {
	async fn mount(&self, location: ShareLocation<'_>, mount_point: &Path) -> Result<()>;

	async fn unmount(&self, mount_point: &Path) -> Result<()>;

	async fn is_mounted(&self, mount_point: &Path) -> Result<bool>;

	/// Whether the host accepts SMB connections right now
	async fn is_reachable(&self, host: &str) -> bool;

	/// Names of the disk shares a host offers to these credentials
	async fn list_shares(&self, host: &str, username: &str, password: &str) -> Result<Vec<String>>;
}

/// Uses `mount.cifs`, `umount` and `smbclient` from the host
pub struct SystemSmbClient {
	connect_timeout: Duration,
}

impl SystemSmbClient {
	pub fn new(connect_timeout: Duration) -> Self {
		Self { connect_timeout }
	}
}

impl Default for SystemSmbClient {
	fn default() -> Self {
		Self::new(Duration::from_secs(3))
	}
}

#[async_trait]
impl SmbClient for SystemSmbClient {
	async fn mount(&self, location: ShareLocation<'_>, mount_point: &Path) -> Result<()> {
		// Files on the share appear owned by whoever owns the mount point
		let owner = fs::metadata(mount_point).await.with_path(mount_point)?;
		let options = format!(
			"uid={},gid={},iocharset=utf8,file_mode=0775,dir_mode=0775",
			owner.uid(),
			owner.gid()
		);
		let source = format!("//{}/{}", location.host, location.share);

		// Credentials travel through the environment, never the argument list
		let output = Command::new("mount")
			.args(["-t", "cifs", &source])
			.arg(mount_point)
			.args(["-o", &options])
			.env("USER", location.username)
			.env("PASSWD", location.password)
			.kill_on_drop(true)
			.output()
			.await
			.map_err(|e| FilesError::command("mount", e.to_string()))?;

		if !output.status.success() {
			return Err(FilesError::command(
				"mount",
				String::from_utf8_lossy(&output.stderr).trim(),
			));
		}
		debug!("Mounted {source} at {}", mount_point.display());
		Ok(())
	}

	async fn unmount(&self, mount_point: &Path) -> Result<()> {
		// Lazy, so an unreachable server cannot block us
		let output = Command::new("umount")
			.arg("-l")
			.arg(mount_point)
			.kill_on_drop(true)
			.output()
			.await
			.map_err(|e| FilesError::command("umount", e.to_string()))?;

		if !output.status.success() {
			return Err(FilesError::command(
				"umount",
				String::from_utf8_lossy(&output.stderr).trim(),
			));
		}
		debug!("Unmounted {}", mount_point.display());
		Ok(())
	}

	async fn is_mounted(&self, mount_point: &Path) -> Result<bool> {
		let mounts = fs::read_to_string(PROC_MOUNTS).await.with_path(PROC_MOUNTS)?;
		Ok(parse_mount_points(&mounts).iter().any(|p| p == mount_point))
	}

	async fn is_reachable(&self, host: &str) -> bool {
		let reachable = matches!(
			tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, SMB_PORT))).await,
			Ok(Ok(_))
		);
		trace!("{host} reachable: {reachable}");
		reachable
	}

	async fn list_shares(&self, host: &str, username: &str, password: &str) -> Result<Vec<String>> {
		let output = Command::new("smbclient")
			.args(["-g", "-L", &format!("//{host}"), "-U", username])
			.env("PASSWD", password)
			.kill_on_drop(true)
			.output()
			.await
			.map_err(|e| FilesError::command("smbclient", e.to_string()))?;

		if !output.status.success() {
			return Err(FilesError::command(
				"smbclient",
				String::from_utf8_lossy(&output.stderr).trim(),
			));
		}
		Ok(parse_share_list(&String::from_utf8_lossy(&output.stdout)))
	}
}

/// Mount points listed in `/proc/mounts`, with octal escapes decoded
pub fn parse_mount_points(mounts: &str) -> Vec<PathBuf> {
	mounts
		.lines()
		.filter_map(|line| line.split_whitespace().nth(1))
		.map(|field| PathBuf::from(unescape_mount_field(field)))
		.collect()
}

fn unescape_mount_field(field: &str) -> String {
	let bytes = field.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		let digits = bytes
			.get(i + 1..i + 4)
			.filter(|digits| digits.iter().all(|b| (b'0'..=b'7').contains(b)));
		if let (b'\\', Some(digits)) = (bytes[i], digits) {
			let value = digits
				.iter()
				.fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
			if let Ok(byte) = u8::try_from(value) {
				out.push(byte);
				i += 4;
				continue;
			}
		}
		out.push(bytes[i]);
		i += 1;
	}
	String::from_utf8_lossy(&out).into_owned()
}

/// Disk share names from `smbclient -g -L` output, hidden `$` shares excluded
pub fn parse_share_list(output: &str) -> Vec<String> {
	output
		.lines()
		.filter_map(|line| {
			let mut fields = line.split('|');
			match (fields.next(), fields.next()) {
				(Some("Disk"), Some(name)) if !name.is_empty() && !name.ends_with('$') => {
					Some(name.to_string())
				}
				_ => None,
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn parses_mount_points_with_escapes() {
		let mounts = "\
proc /proc proc rw,nosuid 0 0
//nas/media /data/network/nas/media cifs rw,relatime 0 0
//nas/my\\040docs /data/network/nas/my\\040docs cifs rw 0 0
";
		assert_eq!(
			parse_mount_points(mounts),
			[
				PathBuf::from("/proc"),
				PathBuf::from("/data/network/nas/media"),
				PathBuf::from("/data/network/nas/my docs"),
			]
		);
	}

	#[test]
	fn lists_only_visible_disk_shares() {
		let output = "\
Disk|media|Media files
Disk|IPC$|IPC Service
IPC|IPC$|IPC Service
Disk|backups|
Printer|laser|Office printer
";
		assert_eq!(parse_share_list(output), ["media", "backups"]);
	}
}
