use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use uf_core::{config::AppConfig, Core};

#[derive(Parser, Debug)]
#[command(name = "uf-daemon", about = "Umbrel Files daemon")]
struct Args {
	/// Path to the data directory
	#[arg(long, env = uf_config::DATA_DIR_ENV)]
	data_dir: Option<PathBuf>,

	/// Log level for the engine's own targets (overridden by RUST_LOG)
	#[arg(long)]
	log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let data_dir = match args.data_dir {
		Some(dir) => dir,
		None => uf_config::default_data_dir()?,
	};
	let config = AppConfig::load_or_create(&data_dir)?;
	let level = args.log_level.unwrap_or_else(|| config.log_level.clone());
	let _guard = uf_core::init_logging(&config.logs_dir(), &level)?;

	let core = Core::new_with_config(config)?;
	core.start().await?;

	// Set up signal handling for graceful shutdown
	#[cfg(unix)]
	let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
		.context("installing SIGTERM handler")?;

	#[cfg(unix)]
	let terminated = terminate.recv();

	#[cfg(not(unix))]
	let terminated = std::future::pending::<Option<()>>();

	tokio::select! {
		result = signal::ctrl_c() => {
			result.context("waiting for Ctrl+C")?;
			info!("Received Ctrl+C, shutting down gracefully...");
		}
		_ = terminated => {
			info!("Received SIGTERM, shutting down gracefully...");
		}
	}

	if let Err(e) = core.shutdown().await {
		error!("Shutdown failed: {e:#}");
		return Err(e);
	}
	Ok(())
}
