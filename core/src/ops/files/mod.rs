//! File operations over the virtual namespace

pub mod archive;
pub mod copy;
pub mod create_folder;
pub mod delete;
pub mod protection;
pub mod query;
pub mod rename;
pub mod resolver;
pub mod unique_name;
pub mod upload;

pub use archive::{archive, unarchive};
pub use copy::{copy, move_entry};
pub use create_folder::create_directory;
pub use delete::{delete, empty_trash, restore, trash};
pub use query::*;
pub use rename::rename;
pub use upload::upload;
