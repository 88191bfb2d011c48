//! Finding SMB servers and shares on the local network

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use mdns_sd::{ServiceDaemon, ServiceEvent};
use tracing::{debug, instrument, warn};

use super::smb::SmbClient;
use crate::common::{FilesError, Result};

const SMB_SERVICE_TYPE: &str = "_smb._tcp.local.";
const DEVICE_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ShareDiscovery {
	smb: Arc<dyn SmbClient>,
	browse_window: Duration,
	http: reqwest::Client,
}

impl ShareDiscovery {
	pub fn new(smb: Arc<dyn SmbClient>, browse_window: Duration) -> Self {
		Self {
			smb,
			browse_window,
			http: reqwest::Client::new(),
		}
	}

	/// Hostnames advertising SMB over mDNS during the browse window
	#[instrument(skip(self), err)]
	pub async fn discover_servers(&self) -> Result<Vec<String>> {
		let daemon = ServiceDaemon::new().map_err(|e| FilesError::command("mdns", e.to_string()))?;
		let mut events = daemon
			.browse(SMB_SERVICE_TYPE)
			.map(|r| r.into_stream())
			.map_err(|e| FilesError::command("mdns", e.to_string()))?;

		let window = tokio::time::sleep(self.browse_window);
		tokio::pin!(window);

		let mut hosts = BTreeSet::new();
		loop {
			tokio::select! {
				_ = &mut window => break,
				event = events.next() => match event {
					Some(ServiceEvent::ServiceResolved(info)) => {
						let host = info.get_hostname().trim_end_matches('.').to_string();
						debug!("Found SMB server {host}");
						hosts.insert(host);
					}
					Some(_) => {}
					None => break,
				},
			}
		}

		if let Err(e) = daemon.shutdown() {
			warn!("Failed to shut down mDNS daemon: {e}");
		}
		Ok(hosts.into_iter().collect())
	}

	#[instrument(skip(self, password), err)]
	pub async fn discover_shares(
		&self,
		host: &str,
		username: &str,
		password: &str,
	) -> Result<Vec<String>> {
		self.smb.list_shares(host, username, password).await
	}

	/// Whether `address` answers the Umbrel `system.online` endpoint
	pub async fn is_umbrel_device(&self, address: &str) -> bool {
		let url = format!("http://{address}/trpc/system.online");
		match self
			.http
			.get(&url)
			.timeout(DEVICE_PROBE_TIMEOUT)
			.send()
			.await
		{
			Ok(response) => response.status().is_success(),
			Err(e) => {
				debug!("{url} did not answer: {e}");
				false
			}
		}
	}
}
