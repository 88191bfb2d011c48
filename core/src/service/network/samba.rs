//! Samba daemon control for outbound shares
//!
//! Outbound shares live in one generated include file. Every change rewrites
//! the whole file and asks `smbd` to reload it.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt, process::Command};
use tracing::{debug, info};
use uf_utils::error::IoResultExt;

use crate::common::{FilesError, Result};

/// Local account that SMB clients authenticate as
pub const SHARE_USER: &str = "umbrel";

/// One rendered `[section]` of the include file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SambaShare {
	pub name: String,
	pub path: PathBuf,
}

#[async_trait]
pub trait SambaDaemon: Send + Sync {
	/// Replace the generated share configuration and reload the daemon
	async fn apply(&self, config: &str) -> Result<()>;

	/// Set the SMB password of `user`
	async fn set_password(&self, user: &str, password: &str) -> Result<()>;
}

/// Talks to the host's Samba installation
pub struct SystemSamba {
	config_path: PathBuf,
}

impl SystemSamba {
	pub fn new(config_path: impl Into<PathBuf>) -> Self {
		Self {
			config_path: config_path.into(),
		}
	}
}

#[async_trait]
impl SambaDaemon for SystemSamba {
	async fn apply(&self, config: &str) -> Result<()> {
		write_atomic(&self.config_path, config).await?;
		run("smbcontrol", &["smbd", "reload-config"]).await?;
		info!("Reloaded Samba configuration from {}", self.config_path.display());
		Ok(())
	}

	async fn set_password(&self, user: &str, password: &str) -> Result<()> {
		let mut child = Command::new("smbpasswd")
			.args(["-s", "-a", user])
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| FilesError::command("smbpasswd", e.to_string()))?;

		if let Some(mut stdin) = child.stdin.take() {
			stdin
				.write_all(format!("{password}\n{password}\n").as_bytes())
				.await
				.map_err(|e| FilesError::command("smbpasswd", e.to_string()))?;
		}

		let output = child
			.wait_with_output()
			.await
			.map_err(|e| FilesError::command("smbpasswd", e.to_string()))?;
		if !output.status.success() {
			return Err(FilesError::command(
				"smbpasswd",
				String::from_utf8_lossy(&output.stderr).trim(),
			));
		}
		debug!("Updated SMB password for {user}");
		Ok(())
	}
}

/// Render the include file for `shares`
pub fn render_config(shares: &[SambaShare]) -> String {
	let mut config = String::from("# Generated by umbrel-files, do not edit\n");
	for share in shares {
		// Writing to a String never fails
		let _ = write!(
			config,
			"\n[{name}]\n\
			\tpath = {path}\n\
			\tbrowseable = yes\n\
			\tread only = no\n\
			\tguest ok = no\n\
			\tvalid users = {user}\n\
			\tforce user = {user}\n\
			\tvfs objects = catia fruit streams_xattr\n",
			name = share.name,
			path = share.path.display(),
			user = SHARE_USER,
		);
	}
	config
}

async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).await.with_path(parent)?;
	}
	let tmp = path.with_extension("conf.tmp");
	fs::write(&tmp, contents).await.with_path(&tmp)?;
	fs::rename(&tmp, path).await.with_path(path)?;
	Ok(())
}

pub(super) async fn run(program: &str, args: &[&str]) -> Result<String> {
	let output = Command::new(program)
		.args(args)
		.kill_on_drop(true)
		.output()
		.await
		.map_err(|e| FilesError::command(program, e.to_string()))?;

	if !output.status.success() {
		let stderr = String::from_utf8_lossy(&output.stderr);
		return Err(FilesError::command(program, stderr.trim()));
	}
	Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
