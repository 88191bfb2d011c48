//! A core wired to fakes inside a temporary data directory

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use uf_core::domain::VirtualPath;
use uf_core::{AppConfig, Core, CoreContext, FilesApi, Session};

use super::fakes::{FakeSmbClient, FixedDiskUsage, RecordingSamba};

pub const PLENTY_OF_SPACE: u64 = 1 << 40;

pub struct TestCore {
	pub core: Core,
	pub session: Session,
	pub disk: Arc<FixedDiskUsage>,
	pub samba: Arc<RecordingSamba>,
	pub smb: Arc<FakeSmbClient>,
	_data_dir: TempDir,
}

impl TestCore {
	pub async fn new() -> anyhow::Result<Self> {
		let data_dir = tempfile::tempdir()?;
		let mut config = AppConfig::default_with_dir(data_dir.path().to_path_buf());
		config.owner_name = "Ada".to_string();
		config.network.samba_shares_config = data_dir.path().join("smb-shares.conf");
		// Reconciliation is driven by hand in tests
		config.network.watch_interval_secs = 3600;

		let disk = Arc::new(FixedDiskUsage::new(PLENTY_OF_SPACE));
		let samba = Arc::new(RecordingSamba::default());
		let smb = Arc::new(FakeSmbClient::default());
		let core = Core::with_services(config, disk.clone(), samba.clone(), smb.clone())?;

		Ok(Self {
			core,
			session: Session::authenticated("ada"),
			disk,
			samba,
			smb,
			_data_dir: data_dir,
		})
	}

	pub fn api(&self) -> &FilesApi {
		&self.core.api
	}

	pub fn ctx(&self) -> &CoreContext {
		&self.core.context
	}

	/// Host path behind a virtual path
	pub fn host(&self, path: &str) -> PathBuf {
		let path = VirtualPath::parse(path).expect("valid virtual path");
		let mut host = self.core.config.roots.get(path.root()).to_path_buf();
		host.extend(path.segments());
		host
	}

	pub fn write(&self, path: &str, contents: &str) -> PathBuf {
		let host = self.host(path);
		std::fs::create_dir_all(host.parent().expect("file has a parent")).expect("create parent");
		std::fs::write(&host, contents).expect("write file");
		host
	}

	pub fn mkdir(&self, path: &str) -> PathBuf {
		let host = self.host(path);
		std::fs::create_dir_all(&host).expect("create directory");
		host
	}

	pub fn read(&self, path: &str) -> String {
		std::fs::read_to_string(self.host(path)).expect("read file")
	}

	pub fn exists(&self, path: &str) -> bool {
		std::fs::symlink_metadata(self.host(path)).is_ok()
	}

	pub fn names_in(&self, path: &str) -> Vec<String> {
		let mut names = std::fs::read_dir(self.host(path))
			.expect("read directory")
			.map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
			.collect::<Vec<_>>();
		names.sort();
		names
	}

	pub fn trash_meta(&self, trashed_name: &str) -> PathBuf {
		self.core
			.config
			.roots
			.trash_meta
			.join(format!("{trashed_name}.json"))
	}
}
