//! Read-only queries over the virtual filesystem

pub mod directory_listing;
pub mod sorting;

pub use directory_listing::{
	list_directory, DirectoryListingInput, DirectoryListingOutput, DEFAULT_PAGE_SIZE,
	MAX_LISTED_ENTRIES,
};
pub use sorting::{natural_cmp, SortBy, SortOrder};
