use thiserror::Error;

pub type Result<T> = std::result::Result<T, FsWatcherError>;

#[derive(Error, Debug)]
pub enum FsWatcherError {
	#[error("notify backend error: {0}")]
	Notify(#[from] notify::Error),
	#[error("watcher is not running")]
	NotRunning,
	#[error("watcher is already running")]
	AlreadyRunning,
}
