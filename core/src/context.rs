//! Shared context providing access to core application components.

use crate::{
	config::AppConfig,
	infra::{event::EventBus, store::FilesStore},
	ops::files::{resolver::PathResolver, unique_name::NameClaims},
	volume::DiskUsageProvider,
};
use std::sync::Arc;

/// Shared context providing access to core application components.
#[derive(Clone)]
pub struct CoreContext {
	pub config: Arc<AppConfig>,
	pub events: Arc<EventBus>,
	pub resolver: Arc<PathResolver>,
	pub claims: Arc<NameClaims>,
	pub disk_usage: Arc<dyn DiskUsageProvider>,
	pub store: Arc<FilesStore>,
}

impl CoreContext {
	/// Create a new context with the given components
	pub fn new(config: Arc<AppConfig>, disk_usage: Arc<dyn DiskUsageProvider>) -> Self {
		Self {
			resolver: Arc::new(PathResolver::new(&config.roots)),
			store: Arc::new(FilesStore::new(config.state_file())),
			events: Arc::new(EventBus::default()),
			claims: Arc::new(NameClaims::new()),
			disk_usage,
			config,
		}
	}
}
