//! Renaming entries and creating directories

mod helpers;

use helpers::*;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_rename_in_place() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.write("/Home/docs/draft.txt", "words");

	let renamed = t.api().rename(&t.session, "/Home/docs/draft.txt", "final.txt").await?;
	assert_eq!(renamed.to_string(), "/Home/docs/final.txt");
	assert_eq!(t.names_in("/Home/docs"), ["final.txt"]);
	assert_eq!(t.read("/Home/docs/final.txt"), "words");

	let same = t.api().rename(&t.session, "/Home/docs/final.txt", "final.txt").await?;
	assert_eq!(same.to_string(), "/Home/docs/final.txt");
	Ok(())
}

#[tokio::test]
async fn test_rename_never_overwrites() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.write("/Home/a.txt", "a");
	t.write("/Home/b.txt", "b");

	let err = t.api().rename(&t.session, "/Home/a.txt", "b.txt").await.unwrap_err();
	assert_eq!(err.code(), Some("destination-already-exists"));
	assert_eq!(t.read("/Home/b.txt"), "b");
	Ok(())
}

#[tokio::test]
async fn test_rename_rejects_bad_names_and_protected_paths() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.write("/Home/a.txt", "a");
	t.mkdir("/Home/Downloads");
	t.mkdir("/Apps/bitcoin");

	for name in ["", "x/y", "..", "."] {
		let err = t.api().rename(&t.session, "/Home/a.txt", name).await.unwrap_err();
		assert_eq!(err.status(), 400, "{name:?}");
		assert_eq!(err.code(), None, "{name:?}");
	}

	let err = t.api().rename(&t.session, "/Home/Downloads", "Stuff").await.unwrap_err();
	assert_eq!(err.code(), Some("operation-not-allowed"));
	let err = t.api().rename(&t.session, "/Apps/bitcoin", "btc").await.unwrap_err();
	assert_eq!(err.code(), Some("operation-not-allowed"));
	let err = t.api().rename(&t.session, "/Home/missing", "x").await.unwrap_err();
	assert_eq!(err.code(), Some("source-not-exists"));
	Ok(())
}

#[tokio::test]
async fn test_create_directory() -> anyhow::Result<()> {
	let t = TestCore::new().await?;

	let created = t.api().create_directory(&t.session, "/Home/Projects").await?;
	assert_eq!(created.to_string(), "/Home/Projects");
	assert!(t.host("/Home/Projects").is_dir());

	let err = t
		.api()
		.create_directory(&t.session, "/Home/Projects")
		.await
		.unwrap_err();
	assert_eq!(err.code(), Some("destination-already-exists"));

	let err = t
		.api()
		.create_directory(&t.session, "/Home/nope/child")
		.await
		.unwrap_err();
	assert_eq!(err.code(), Some("destination-not-exist"));

	for path in ["/Apps/new", "/Trash/new", "/Backups/new", "/Network/host"] {
		let err = t.api().create_directory(&t.session, path).await.unwrap_err();
		assert_eq!(err.code(), Some("operation-not-allowed"), "{path}");
	}
	Ok(())
}
