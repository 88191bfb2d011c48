//! SMB sharing in both directions: publishing local directories and
//! mounting shares from other hosts

pub mod discovery;
pub mod mount_watcher;
pub mod mounts;
pub mod samba;
pub mod share_watcher;
pub mod shares;
pub mod smb;

pub use discovery::ShareDiscovery;
pub use mount_watcher::MountWatcher;
pub use mounts::NetworkShareService;
pub use samba::{SambaDaemon, SystemSamba};
pub use share_watcher::ShareWatcher;
pub use shares::ShareService;
pub use smb::{ShareLocation, SmbClient, SystemSmbClient};
