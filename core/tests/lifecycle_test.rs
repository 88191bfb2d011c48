//! Starting and stopping the core with its background services

mod helpers;

use std::time::Duration;

use helpers::*;
use pretty_assertions::assert_eq;

#[tokio::test(flavor = "multi_thread")]
async fn test_start_mounts_registered_shares_and_shutdown_unmounts() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.smb.set_reachable("nas.local", true);
	t.api()
		.add_network_share(&t.session, "nas.local", "media", "ada", "secret")
		.await?;
	t.core.services.network_shares.unmount_all().await?;
	let mount_point = t.host("/Network/nas.local/media");
	assert!(!t.smb.is_mounted_at(&mount_point));

	t.core.start().await?;
	assert!(t.smb.is_mounted_at(&mount_point));
	assert!(t.samba.reloads() >= 1);

	t.core.shutdown().await?;
	assert!(!t.smb.is_mounted_at(&mount_point));
	assert_eq!(t.api().list_network_shares(&t.session).await?.len(), 1);
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_share_is_dropped_when_its_directory_is_deleted() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	let photos = t.mkdir("/Home/Photos");
	t.mkdir("/Home/Music");
	t.api().add_share(&t.session, "/Home/Photos").await?;
	t.api().add_share(&t.session, "/Home/Music").await?;

	t.core.start().await?;
	std::fs::remove_dir(&photos)?;

	let mut remaining = t.api().shares(&t.session).await?;
	for _ in 0..100 {
		if remaining.len() == 1 {
			break;
		}
		tokio::time::sleep(Duration::from_millis(100)).await;
		remaining = t.api().shares(&t.session).await?;
	}
	t.core.shutdown().await?;

	assert_eq!(remaining.len(), 1);
	assert_eq!(remaining[0].name, "Music");
	Ok(())
}

#[test]
fn test_core_is_built_from_a_data_directory_without_a_runtime() -> anyhow::Result<()> {
	let data_dir = tempfile::tempdir()?;

	let core = uf_core::Core::new(data_dir.path())?;
	assert_eq!(core.data_dir(), &data_dir.path().to_path_buf());
	assert!(data_dir.path().join("files.json").exists());
	assert!(core.config.roots.home.is_dir());
	assert!(core.config.roots.trash.is_dir());
	Ok(())
}
