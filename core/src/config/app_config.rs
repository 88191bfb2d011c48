//! Application configuration

use super::{default_data_dir, Migrate};
use crate::domain::Root;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const CONFIG_FILE: &str = "files.json";
const STATE_FILE: &str = "files.yaml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	/// Config schema version
	pub version: u32,

	/// Data directory path
	pub data_dir: PathBuf,

	/// Logging level
	pub log_level: String,

	/// Owner of the device, used to name the shared home folder
	pub owner_name: String,

	/// Host directories backing each virtual root
	pub roots: RootPaths,

	pub network: NetworkConfig,
}

/// Host directory for every virtual root, plus the trash sidecar directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootPaths {
	pub home: PathBuf,
	pub apps: PathBuf,
	pub backups: PathBuf,
	pub external: PathBuf,
	pub network: PathBuf,
	pub trash: PathBuf,
	/// Holds `<name>.json` sidecars for trashed items; never inside `trash`
	pub trash_meta: PathBuf,
}

impl RootPaths {
	pub fn under(base: &Path) -> Self {
		Self {
			home: base.join("home"),
			apps: base.join("app-data"),
			backups: base.join("backups"),
			external: base.join("external"),
			network: base.join("network"),
			trash: base.join("trash"),
			trash_meta: base.join("trash-meta"),
		}
	}

	pub fn get(&self, root: Root) -> &Path {
		match root {
			Root::Home => &self.home,
			Root::Apps => &self.apps,
			Root::Backups => &self.backups,
			Root::External => &self.external,
			Root::Network => &self.network,
			Root::Trash => &self.trash,
		}
	}

	fn all(&self) -> [&Path; 7] {
		[
			&self.home,
			&self.apps,
			&self.backups,
			&self.external,
			&self.network,
			&self.trash,
			&self.trash_meta,
		]
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
	/// Seconds between mount health checks
	pub watch_interval_secs: u64,
	/// How long mDNS browsing runs before returning
	pub discovery_timeout_secs: u64,
	/// Generated Samba include file holding the outbound shares
	pub samba_shares_config: PathBuf,
}

impl NetworkConfig {
	pub fn watch_interval(&self) -> Duration {
		Duration::from_secs(self.watch_interval_secs.max(1))
	}

	pub fn discovery_timeout(&self) -> Duration {
		Duration::from_secs(self.discovery_timeout_secs.max(1))
	}
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			watch_interval_secs: 10,
			discovery_timeout_secs: 5,
			samba_shares_config: PathBuf::from("/etc/samba/smb.conf.d/umbrel-files.conf"),
		}
	}
}

impl AppConfig {
	/// Load configuration from the default location
	pub fn load() -> Result<Self> {
		let data_dir = default_data_dir()?;
		Self::load_from(&data_dir)
	}

	/// Load configuration from a specific data directory
	pub fn load_from(data_dir: &Path) -> Result<Self> {
		let config_path = data_dir.join(CONFIG_FILE);

		if config_path.exists() {
			info!("Loading config from {:?}", config_path);
			let json = fs::read_to_string(&config_path)
				.with_context(|| format!("reading {}", config_path.display()))?;
			let mut config: AppConfig = serde_json::from_str(&json)
				.with_context(|| format!("parsing {}", config_path.display()))?;

			if config.needs_migration() {
				info!(
					"Migrating config from v{} to v{}",
					config.version,
					Self::target_version()
				);
				config.migrate()?;
				config.save()?;
			}

			Ok(config)
		} else {
			warn!("No config found, creating default at {:?}", config_path);
			let config = Self::default_with_dir(data_dir.to_path_buf());
			config.save()?;
			Ok(config)
		}
	}

	/// Load or create configuration, replacing an unreadable file with defaults
	pub fn load_or_create(data_dir: &Path) -> Result<Self> {
		Self::load_from(data_dir).or_else(|e| {
			warn!("Falling back to default config: {e:#}");
			let config = Self::default_with_dir(data_dir.to_path_buf());
			config.save()?;
			Ok(config)
		})
	}

	/// Create default configuration with specific data directory
	pub fn default_with_dir(data_dir: PathBuf) -> Self {
		Self {
			version: Self::target_version(),
			roots: RootPaths::under(&data_dir.join("storage")),
			data_dir,
			log_level: "info".to_string(),
			owner_name: whoami::realname(),
			network: NetworkConfig::default(),
		}
	}

	/// Save configuration to disk
	pub fn save(&self) -> Result<()> {
		fs::create_dir_all(&self.data_dir)?;

		let config_path = self.data_dir.join(CONFIG_FILE);
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json)?;
		info!("Saved config to {:?}", config_path);
		Ok(())
	}

	/// Get the path for logs directory
	pub fn logs_dir(&self) -> PathBuf {
		self.data_dir.join("logs")
	}

	/// Registry of shares and mounts
	pub fn state_file(&self) -> PathBuf {
		self.data_dir.join(STATE_FILE)
	}

	/// Ensure all required directories exist
	pub fn ensure_directories(&self) -> Result<()> {
		fs::create_dir_all(&self.data_dir)?;
		fs::create_dir_all(self.logs_dir())?;
		for dir in self.roots.all() {
			fs::create_dir_all(dir)
				.with_context(|| format!("creating root directory {}", dir.display()))?;
		}
		if self.roots.trash_meta.starts_with(&self.roots.trash) {
			return Err(anyhow!("trash metadata directory must live outside the trash"));
		}
		Ok(())
	}
}

impl Default for AppConfig {
	fn default() -> Self {
		let data_dir = default_data_dir().unwrap_or_else(|_| PathBuf::from("."));
		Self::default_with_dir(data_dir)
	}
}

impl Migrate for AppConfig {
	fn current_version(&self) -> u32 {
		self.version
	}

	fn target_version() -> u32 {
		2
	}

	fn migrate(&mut self) -> Result<()> {
		loop {
			match self.version {
				// v1 kept trash sidecars in `<trash>/.meta`
				1 => {
					let legacy = self.roots.trash.join(".meta");
					if self.roots.trash_meta == legacy {
						let moved = self.data_dir.join("trash-meta");
						if legacy.exists() {
							fs::create_dir_all(moved.parent().unwrap_or(&self.data_dir))?;
							fs::rename(&legacy, &moved).with_context(|| {
								format!("moving trash metadata out of {}", legacy.display())
							})?;
						}
						self.roots.trash_meta = moved;
					}
					self.version = 2;
				}
				2 => return Ok(()),
				v => return Err(anyhow!("Unknown config version: {}", v)),
			}
		}
	}
}
