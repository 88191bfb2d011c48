//! Trash, restore and permanent deletion

mod helpers;

use helpers::*;
use pretty_assertions::assert_eq;
use uf_core::domain::CollisionPolicy;
use uf_core::infra::event::{Event, FileOperation};
use uf_core::ops::files::delete::TrashMetadata;

#[tokio::test]
async fn test_trash_and_restore_round_trip() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.write("/Home/Documents/notes.txt", "notes");
	let mut events = t.core.events().subscribe();

	let trashed = t.api().trash(&t.session, "/Home/Documents/notes.txt").await?;
	assert_eq!(trashed.to_string(), "/Trash/notes.txt");
	assert!(!t.exists("/Home/Documents/notes.txt"));

	let sidecar: TrashMetadata = serde_json::from_slice(&std::fs::read(t.trash_meta("notes.txt"))?)?;
	assert_eq!(sidecar.path.to_string(), "/Home/Documents/notes.txt");
	assert!(sidecar.deleted_at > 0);

	match events.recv().await? {
		Event::OperationCompleted { kind, path, .. } => {
			assert_eq!(kind, FileOperation::Trash);
			assert_eq!(path, trashed);
		}
		other => panic!("unexpected event {other:?}"),
	}

	let restored = t
		.api()
		.restore(&t.session, "/Trash/notes.txt", CollisionPolicy::Error)
		.await?;
	assert_eq!(restored.to_string(), "/Home/Documents/notes.txt");
	assert_eq!(t.read("/Home/Documents/notes.txt"), "notes");
	assert!(!t.trash_meta("notes.txt").exists());
	assert!(t.names_in("/Trash").is_empty());
	Ok(())
}

#[tokio::test]
async fn test_trashing_same_name_twice_keeps_both() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.write("/Home/a/report.pdf", "first");
	t.write("/Home/b/report.pdf", "second");

	let first = t.api().trash(&t.session, "/Home/a/report.pdf").await?;
	let second = t.api().trash(&t.session, "/Home/b/report.pdf").await?;
	assert_eq!(first.to_string(), "/Trash/report.pdf");
	assert_eq!(second.to_string(), "/Trash/report (2).pdf");

	let restored = t
		.api()
		.restore(&t.session, "/Trash/report (2).pdf", CollisionPolicy::Error)
		.await?;
	assert_eq!(restored.to_string(), "/Home/b/report.pdf");
	assert_eq!(t.read("/Home/b/report.pdf"), "second");
	Ok(())
}

#[tokio::test]
async fn test_restore_recreates_missing_parents_and_respects_collisions() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.write("/Home/projects/site/index.html", "v1");

	t.api().trash(&t.session, "/Home/projects").await?;
	assert!(!t.exists("/Home/projects"));

	// Something new took the old name meanwhile
	t.write("/Home/projects/readme.md", "new");
	let err = t
		.api()
		.restore(&t.session, "/Trash/projects", CollisionPolicy::Error)
		.await
		.unwrap_err();
	assert_eq!(err.code(), Some("destination-already-exists"));

	// Restoring one file out of a trashed directory uses the directory's record
	let restored = t
		.api()
		.restore(&t.session, "/Trash/projects/site/index.html", CollisionPolicy::Error)
		.await?;
	assert_eq!(restored.to_string(), "/Home/projects/site/index.html");
	assert_eq!(t.read("/Home/projects/site/index.html"), "v1");
	assert!(t.trash_meta("projects").exists());

	let restored = t
		.api()
		.restore(&t.session, "/Trash/projects", CollisionPolicy::KeepBoth)
		.await?;
	assert_eq!(restored.to_string(), "/Home/projects (2)");
	assert!(!t.trash_meta("projects").exists());
	Ok(())
}

#[tokio::test]
async fn test_restore_without_sidecar_fails() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.write("/Trash/stray.txt", "?");

	let err = t
		.api()
		.restore(&t.session, "/Trash/stray.txt", CollisionPolicy::Error)
		.await
		.unwrap_err();
	assert_eq!(err.code(), Some("trash-meta-not-exists"));
	assert!(t.exists("/Trash/stray.txt"));
	Ok(())
}

#[tokio::test]
async fn test_protected_and_trashed_items_cannot_be_trashed() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.mkdir("/Home/Downloads");
	t.mkdir("/Apps/bitcoin");
	t.write("/Trash/old.txt", "old");

	for path in ["/Home", "/Home/Downloads", "/Apps/bitcoin", "/Trash/old.txt"] {
		let err = t.api().trash(&t.session, path).await.unwrap_err();
		assert_eq!(err.code(), Some("operation-not-allowed"), "{path}");
	}
	Ok(())
}

#[tokio::test]
async fn test_delete_and_empty_trash() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.write("/Home/a.txt", "a");
	t.write("/Home/b/c.txt", "c");
	t.api().trash(&t.session, "/Home/a.txt").await?;
	t.api().trash(&t.session, "/Home/b").await?;

	// Only trashed or network-backed items can be deleted outright
	t.write("/Home/keep.txt", "keep");
	let err = t.api().delete(&t.session, "/Home/keep.txt").await.unwrap_err();
	assert_eq!(err.code(), Some("operation-not-allowed"));

	t.api().delete(&t.session, "/Trash/a.txt").await?;
	assert!(!t.exists("/Trash/a.txt"));
	assert!(!t.trash_meta("a.txt").exists());

	assert_eq!(t.api().empty_trash(&t.session).await?, 1);
	assert!(t.names_in("/Trash").is_empty());
	assert!(!t.trash_meta("b").exists());
	Ok(())
}

#[tokio::test]
async fn test_symlink_survives_trash_and_restore() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	let target = t.write("/Home/target.txt", "target");
	std::os::unix::fs::symlink(&target, t.host("/Home/link"))?;

	let trashed = t.api().trash(&t.session, "/Home/link").await?;
	assert_eq!(trashed.to_string(), "/Trash/link");
	assert!(std::fs::symlink_metadata(t.host("/Trash/link"))?.file_type().is_symlink());

	let restored = t
		.api()
		.restore(&t.session, "/Trash/link", CollisionPolicy::Error)
		.await?;
	assert_eq!(restored.to_string(), "/Home/link");
	assert_eq!(std::fs::read_link(t.host("/Home/link"))?, target);
	assert_eq!(t.read("/Home/link"), "target");
	assert!(!t.exists("/Trash/link"));
	assert!(!t.trash_meta("link").exists());

	// Deleting the trashed link leaves what it pointed at alone
	t.api().trash(&t.session, "/Home/link").await?;
	t.api().delete(&t.session, "/Trash/link").await?;
	assert!(!t.exists("/Trash/link"));
	assert_eq!(t.read("/Home/target.txt"), "target");
	Ok(())
}

#[tokio::test]
async fn test_restore_does_not_recreate_an_unplugged_drive() -> anyhow::Result<()> {
	let t = TestCore::new().await?;
	t.write("/External/usb/photo.jpg", "jpeg");
	t.api().trash(&t.session, "/External/usb/photo.jpg").await?;
	std::fs::remove_dir(t.host("/External/usb"))?;

	let err = t
		.api()
		.restore(&t.session, "/Trash/photo.jpg", CollisionPolicy::Error)
		.await
		.unwrap_err();
	assert_eq!(err.code(), Some("operation-not-allowed"));
	assert!(!t.exists("/External/usb"));
	assert!(t.exists("/Trash/photo.jpg"));
	assert!(t.trash_meta("photo.jpg").exists());

	// Once the drive is back the item goes home
	t.mkdir("/External/usb");
	let restored = t
		.api()
		.restore(&t.session, "/Trash/photo.jpg", CollisionPolicy::Error)
		.await?;
	assert_eq!(restored.to_string(), "/External/usb/photo.jpg");
	Ok(())
}
