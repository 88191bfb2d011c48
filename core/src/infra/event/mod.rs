//! Event bus for decoupled communication

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::VirtualPath;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
	/// Core has started
	CoreStarted,

	/// Core is shutting down
	CoreShutdown,

	/// Bytes transferred so far for a long running operation
	#[serde(rename_all = "camelCase")]
	OperationProgress {
		operation_id: Uuid,
		kind: FileOperation,
		bytes_done: u64,
		bytes_total: u64,
	},

	#[serde(rename_all = "camelCase")]
	OperationCompleted {
		operation_id: Uuid,
		kind: FileOperation,
		path: VirtualPath,
	},

	SharesChanged,

	#[serde(rename_all = "camelCase")]
	NetworkShareMounted { mount_path: VirtualPath },

	#[serde(rename_all = "camelCase")]
	NetworkShareUnmounted { mount_path: VirtualPath },
}

/// Types of file operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
	Copy,
	Move,
	Trash,
	Restore,
	Archive,
	Unarchive,
	Upload,
}

/// Event bus for broadcasting events
pub struct EventBus {
	sender: broadcast::Sender<Event>,
}

impl EventBus {
	/// Create a new event bus with specified capacity
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Emit an event
	pub fn emit(&self, event: Event) {
		// Ignore send errors (no receivers)
		let _ = self.sender.send(event);
	}

	/// Subscribe to events
	pub fn subscribe(&self) -> broadcast::Receiver<Event> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1024)
	}
}

/// Progress reporter bound to one operation
#[derive(Clone)]
pub struct ProgressReporter {
	sender: broadcast::Sender<Event>,
	operation_id: Uuid,
	kind: FileOperation,
}

impl ProgressReporter {
	pub fn new(bus: &EventBus, kind: FileOperation) -> Self {
		Self {
			sender: bus.sender.clone(),
			operation_id: Uuid::new_v4(),
			kind,
		}
	}

	pub fn operation_id(&self) -> Uuid {
		self.operation_id
	}

	pub fn progress(&self, bytes_done: u64, bytes_total: u64) {
		let _ = self.sender.send(Event::OperationProgress {
			operation_id: self.operation_id,
			kind: self.kind,
			bytes_done,
			bytes_total,
		});
	}

	pub fn completed(&self, path: &VirtualPath) {
		let _ = self.sender.send(Event::OperationCompleted {
			operation_id: self.operation_id,
			kind: self.kind,
			path: path.clone(),
		});
	}
}
