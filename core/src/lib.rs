//! Virtual filesystem engine for a home server.
//!
//! Exposes the `/Home`, `/Apps`, `/Backups`, `/External`, `/Network` and
//! `/Trash` namespace over host directories, the file operations a file
//! manager needs, and SMB sharing in both directions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod api;
pub mod common;
pub mod config;
pub mod context;
pub mod domain;
pub mod infra;
pub mod ops;
pub mod service;
pub mod volume;

pub use api::FilesApi;
pub use common::{FilesError, Result};
pub use config::AppConfig;
pub use context::CoreContext;
pub use infra::auth::Session;
pub use infra::event::{Event, EventBus};

use crate::service::network::{SambaDaemon, SmbClient, SystemSamba, SystemSmbClient};
use crate::service::Services;
use crate::volume::{DfDiskUsage, DiskUsageProvider};

/// The running engine: configuration, shared context, services and the API
pub struct Core {
	pub config: Arc<AppConfig>,
	pub context: CoreContext,
	pub services: Arc<Services>,
	pub api: FilesApi,
}

impl Core {
	/// Load or create the configuration in `data_dir` and wire the host collaborators
	pub fn new(data_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
		let config = AppConfig::load_or_create(data_dir.as_ref())?;
		Self::new_with_config(config)
	}

	pub fn new_with_config(config: AppConfig) -> anyhow::Result<Self> {
		let samba = Arc::new(SystemSamba::new(config.network.samba_shares_config.clone()));
		Self::with_services(
			config,
			Arc::new(DfDiskUsage),
			samba,
			Arc::new(SystemSmbClient::default()),
		)
	}

	/// Build a core around explicit collaborators
	pub fn with_services(
		config: AppConfig,
		disk_usage: Arc<dyn DiskUsageProvider>,
		samba: Arc<dyn SambaDaemon>,
		smb: Arc<dyn SmbClient>,
	) -> anyhow::Result<Self> {
		config
			.ensure_directories()
			.context("preparing data directories")?;

		let config = Arc::new(config);
		let context = CoreContext::new(Arc::clone(&config), disk_usage);
		let services = Arc::new(Services::new(&context, samba, smb));
		let api = FilesApi::new(context.clone(), Arc::clone(&services));

		Ok(Self {
			config,
			context,
			services,
			api,
		})
	}

	pub fn events(&self) -> &EventBus {
		&self.context.events
	}

	pub fn data_dir(&self) -> &PathBuf {
		&self.config.data_dir
	}

	/// Start background services; registered network shares are mounted here
	pub async fn start(&self) -> anyhow::Result<()> {
		self.services.start_all().await?;
		self.context.events.emit(Event::CoreStarted);
		info!("Core started in {}", self.config.data_dir.display());
		Ok(())
	}

	/// Stop background services and unmount network shares
	pub async fn shutdown(&self) -> anyhow::Result<()> {
		info!("Core shutting down...");
		self.context.events.emit(Event::CoreShutdown);
		self.services.stop_all().await?;
		info!("Shutdown complete.");
		Ok(())
	}
}

/// Install the global subscriber: console output plus a daily rolling file.
///
/// The returned guard flushes the file writer when dropped and must be kept alive.
pub fn init_logging(logs_dir: &Path, level: &str) -> anyhow::Result<WorkerGuard> {
	std::fs::create_dir_all(logs_dir)
		.with_context(|| format!("creating log directory {}", logs_dir.display()))?;

	let (non_blocking, guard) = tracing_appender::non_blocking(rolling::daily(logs_dir, "log"));

	let filter = EnvFilter::try_from_default_env().or_else(|_| {
		EnvFilter::try_new(format!("warn,uf_core={level},uf_fs_watcher={level},uf_daemon={level}"))
	})?;

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer())
		.with(
			fmt::layer()
				.with_writer(non_blocking)
				.with_ansi(false),
		)
		.try_init()
		.context("installing tracing subscriber")?;

	Ok(guard)
}
