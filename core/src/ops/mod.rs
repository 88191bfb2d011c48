//! Operations exposed by the core

pub mod files;
