pub mod errors;

pub use errors::{ErrorClass, FilesError, Result};
