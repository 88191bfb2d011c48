//! Application configuration management

pub mod app_config;
pub mod migration;

pub use app_config::{AppConfig, NetworkConfig, RootPaths};
pub use migration::Migrate;
pub use uf_config::default_data_dir;
