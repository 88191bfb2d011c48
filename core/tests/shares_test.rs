//! Publishing local directories over SMB

mod helpers;

use helpers::*;
use pretty_assertions::assert_eq;
use uf_core::service::network::ShareWatcher;
use uf_fs_watcher::FsEvent;

#[tokio::test]
async fn test_add_share_publishes_directory() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	let documents = t.mkdir("/Home/Documents");

	let share = t.api().add_share(&t.session, "/Home/Documents").await?;
	assert_eq!(share.name, "Documents");
	assert_eq!(share.path.to_string(), "/Home/Documents");

	let shares = t.api().shares(&t.session).await?;
	assert_eq!(shares, vec![share.clone()]);

	let config = t.samba.last_config().expect("config applied");
	assert!(config.contains("[Documents]"), "{config}");
	assert!(
		config.contains(&format!("path = {}", documents.display())),
		"{config}"
	);

	let passwords = t.samba.passwords.lock().clone();
	assert_eq!(passwords.len(), 1);
	assert_eq!(passwords[0].0, "umbrel");
	assert_eq!(t.api().share_password(&t.session).await?, passwords[0].1);
	assert_eq!(passwords[0].1.len(), 16);

	// Adding again is a no-op
	let reloads = t.samba.reloads();
	assert_eq!(t.api().add_share(&t.session, "/Home/Documents").await?, share);
	assert_eq!(t.samba.reloads(), reloads);
	assert_eq!(t.samba.passwords.lock().len(), 1);
	Ok(())
}

#[tokio::test]
async fn test_only_home_and_external_directories_are_shareable() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.mkdir("/Apps/bitcoin");
	t.write("/Home/file.txt", "not a dir");

	let err = t.api().add_share(&t.session, "/Apps/bitcoin").await.unwrap_err();
	assert_eq!(err.code(), Some("operation-not-allowed"));
	let err = t.api().add_share(&t.session, "/Home/file.txt").await.unwrap_err();
	assert_eq!(err.code(), Some("operation-not-allowed"));
	let err = t.api().add_share(&t.session, "/Home/missing").await.unwrap_err();
	assert_eq!(err.code(), Some("source-not-exists"));

	assert!(t.api().shares(&t.session).await?.is_empty());
	Ok(())
}

#[tokio::test]
async fn test_share_names() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.mkdir("/Home/a/Media");
	t.mkdir("/Home/b/media");

	t.api().add_share(&t.session, "/Home").await?;
	t.api().add_share(&t.session, "/Home/a/Media").await?;
	t.api().add_share(&t.session, "/Home/b/media").await?;

	let names = t
		.api()
		.shares(&t.session)
		.await?
		.into_iter()
		.map(|share| share.name)
		.collect::<Vec<_>>();
	assert_eq!(names, ["Ada's Umbrel", "Media", "media (2)"]);
	Ok(())
}

#[tokio::test]
async fn test_remove_share() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.mkdir("/Home/Documents");
	t.api().add_share(&t.session, "/Home/Documents").await?;

	t.api().remove_share(&t.session, "/Home/Documents").await?;
	assert!(t.api().shares(&t.session).await?.is_empty());
	let config = t.samba.last_config().expect("config applied");
	assert!(!config.contains("[Documents]"), "{config}");

	// Unknown paths are ignored
	let reloads = t.samba.reloads();
	t.api().remove_share(&t.session, "/Home/Documents").await?;
	assert_eq!(t.samba.reloads(), reloads);
	Ok(())
}

#[tokio::test]
async fn test_vanished_directories_are_pruned() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.mkdir("/Home/Photos/2024");
	t.mkdir("/Home/Docs");
	t.mkdir("/Home/Music");
	for path in ["/Home/Photos", "/Home/Photos/2024", "/Home/Docs", "/Home/Music"] {
		t.api().add_share(&t.session, path).await?;
	}

	let shares = &t.core.services.shares;
	let resolver = &t.ctx().resolver;

	let removed =
		ShareWatcher::handle_event(shares, resolver, &FsEvent::remove(t.host("/Home/Photos")))
			.await?;
	assert_eq!(removed, 2);

	let removed = ShareWatcher::handle_event(
		shares,
		resolver,
		&FsEvent::rename(t.host("/Home/Docs"), t.host("/Home/Documents")),
	)
	.await?;
	assert_eq!(removed, 1);

	// Unrelated events change nothing
	let removed =
		ShareWatcher::handle_event(shares, resolver, &FsEvent::create(t.host("/Home/new")))
			.await?;
	assert_eq!(removed, 0);
	let removed =
		ShareWatcher::handle_event(shares, resolver, &FsEvent::remove(t.host("/Home/Mus")))
			.await?;
	assert_eq!(removed, 0);

	let remaining = t.api().shares(&t.session).await?;
	assert_eq!(remaining.len(), 1);
	assert_eq!(remaining[0].path.to_string(), "/Home/Music");
	Ok(())
}

#[tokio::test]
async fn test_prune_missing_on_startup() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	let gone = t.mkdir("/Home/Gone");
	t.mkdir("/Home/Kept");
	t.api().add_share(&t.session, "/Home/Gone").await?;
	t.api().add_share(&t.session, "/Home/Kept").await?;

	std::fs::remove_dir(gone)?;
	assert_eq!(t.core.services.shares.prune_missing().await?, 1);

	let remaining = t.api().shares(&t.session).await?;
	assert_eq!(remaining.len(), 1);
	assert_eq!(remaining[0].name, "Kept");
	Ok(())
}
