//! Handler for backends that report renames with both paths

use crate::event::{FsEvent, RawEventKind, RawNotifyEvent};
use crate::platform::EventHandler;
use crate::Result;

#[derive(Default)]
pub struct PassthroughHandler;

impl PassthroughHandler {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait::async_trait]
impl EventHandler for PassthroughHandler {
	async fn process(&self, event: RawNotifyEvent) -> Result<Vec<FsEvent>> {
		let Some(path) = event.primary_path().cloned() else {
			return Ok(vec![]);
		};

		Ok(match event.kind {
			RawEventKind::Create | RawEventKind::RenameTo => vec![FsEvent::create(path)],
			RawEventKind::Remove | RawEventKind::RenameFrom => vec![FsEvent::remove(path)],
			RawEventKind::Modify => vec![FsEvent::modify(path)],
			RawEventKind::Rename if event.paths.len() >= 2 => {
				vec![FsEvent::rename(path, event.paths[1].clone())]
			}
			RawEventKind::Rename | RawEventKind::Other(_) => vec![],
		})
	}

	async fn tick(&self) -> Result<Vec<FsEvent>> {
		Ok(vec![])
	}

	async fn reset(&self) {}
}
