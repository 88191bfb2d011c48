//! Storage capacity queries

pub mod usage;

pub use usage::{DfDiskUsage, DiskUsage, DiskUsageProvider};
