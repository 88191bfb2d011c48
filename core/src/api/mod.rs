//! Entry points for transports
//!
//! Every call takes the caller's session and fails `Unauthorized` before
//! looking at any argument when no user is attached.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use tracing::debug;

use crate::common::Result;
use crate::context::CoreContext;
use crate::domain::{CollisionPolicy, NetworkShare, NetworkShareStatus, VirtualPath};
use crate::infra::auth::Session;
use crate::ops::files::{self, DirectoryListingInput, DirectoryListingOutput};
use crate::service::Services;

#[derive(Clone)]
pub struct FilesApi {
	ctx: CoreContext,
	services: Arc<Services>,
}

impl FilesApi {
	pub fn new(ctx: CoreContext, services: Arc<Services>) -> Self {
		Self { ctx, services }
	}

	fn authorize(&self, session: &Session) -> Result<()> {
		let user = session.require_user()?;
		debug!(user = %user.name, "Authorized request");
		Ok(())
	}

	pub async fn list(
		&self,
		session: &Session,
		input: DirectoryListingInput,
	) -> Result<DirectoryListingOutput> {
		self.authorize(session)?;
		files::list_directory(&self.ctx, input).await
	}

	pub async fn copy(
		&self,
		session: &Session,
		path: &str,
		to_directory: &str,
		collision: CollisionPolicy,
	) -> Result<VirtualPath> {
		self.authorize(session)?;
		files::copy(&self.ctx, path, to_directory, collision).await
	}

	pub async fn move_entry(
		&self,
		session: &Session,
		path: &str,
		to_directory: &str,
		collision: CollisionPolicy,
	) -> Result<VirtualPath> {
		self.authorize(session)?;
		files::move_entry(&self.ctx, path, to_directory, collision).await
	}

	pub async fn trash(&self, session: &Session, path: &str) -> Result<VirtualPath> {
		self.authorize(session)?;
		files::trash(&self.ctx, path).await
	}

	pub async fn restore(
		&self,
		session: &Session,
		path: &str,
		collision: CollisionPolicy,
	) -> Result<VirtualPath> {
		self.authorize(session)?;
		files::restore(&self.ctx, path, collision).await
	}

	pub async fn delete(&self, session: &Session, path: &str) -> Result<()> {
		self.authorize(session)?;
		files::delete(&self.ctx, path).await
	}

	pub async fn empty_trash(&self, session: &Session) -> Result<usize> {
		self.authorize(session)?;
		files::empty_trash(&self.ctx).await
	}

	pub async fn rename(&self, session: &Session, path: &str, new_name: &str) -> Result<VirtualPath> {
		self.authorize(session)?;
		files::rename(&self.ctx, path, new_name).await
	}

	pub async fn create_directory(&self, session: &Session, path: &str) -> Result<VirtualPath> {
		self.authorize(session)?;
		files::create_directory(&self.ctx, path).await
	}

	pub async fn archive(&self, session: &Session, paths: &[String]) -> Result<VirtualPath> {
		self.authorize(session)?;
		files::archive(&self.ctx, paths).await
	}

	pub async fn unarchive(&self, session: &Session, path: &str) -> Result<VirtualPath> {
		self.authorize(session)?;
		files::unarchive(&self.ctx, path).await
	}

	pub async fn upload<S>(
		&self,
		session: &Session,
		path: &str,
		collision: CollisionPolicy,
		body: S,
	) -> Result<VirtualPath>
	where
		S: Stream<Item = io::Result<Bytes>> + Unpin,
	{
		self.authorize(session)?;
		files::upload(&self.ctx, path, collision, body).await
	}

	pub async fn shares(&self, session: &Session) -> Result<Vec<NetworkShare>> {
		self.authorize(session)?;
		self.services.shares.shares().await
	}

	pub async fn add_share(&self, session: &Session, path: &str) -> Result<NetworkShare> {
		self.authorize(session)?;
		self.services.shares.add_share(path).await
	}

	pub async fn remove_share(&self, session: &Session, path: &str) -> Result<()> {
		self.authorize(session)?;
		self.services.shares.remove_share(path).await
	}

	pub async fn share_password(&self, session: &Session) -> Result<String> {
		self.authorize(session)?;
		self.services.shares.share_password().await
	}

	pub async fn list_network_shares(&self, session: &Session) -> Result<Vec<NetworkShareStatus>> {
		self.authorize(session)?;
		self.services.network_shares.list().await
	}

	pub async fn add_network_share(
		&self,
		session: &Session,
		host: &str,
		share: &str,
		username: &str,
		password: &str,
	) -> Result<VirtualPath> {
		self.authorize(session)?;
		self.services
			.network_shares
			.add(host, share, username, password)
			.await
	}

	pub async fn remove_network_share(&self, session: &Session, mount_path: &str) -> Result<()> {
		self.authorize(session)?;
		self.services.network_shares.remove(mount_path).await
	}

	pub async fn discover_network_share_servers(&self, session: &Session) -> Result<Vec<String>> {
		self.authorize(session)?;
		self.services.discovery.discover_servers().await
	}

	pub async fn discover_network_shares_on_server(
		&self,
		session: &Session,
		host: &str,
		username: &str,
		password: &str,
	) -> Result<Vec<String>> {
		self.authorize(session)?;
		self.services
			.discovery
			.discover_shares(host, username, password)
			.await
	}

	pub async fn is_server_an_umbrel_device(&self, session: &Session, address: &str) -> Result<bool> {
		self.authorize(session)?;
		Ok(self.services.discovery.is_umbrel_device(address).await)
	}
}
