//! Domain types shared across operations

pub mod addressing;
pub mod file;
pub mod share;

pub use addressing::{Root, VirtualPath};
pub use file::{CollisionPolicy, EntryKind, FileEntry, Operation};
pub use share::{NetworkShare, NetworkShareRecord, NetworkShareStatus, ShareRecord};
