//! Infrastructure shared by every operation

pub mod auth;
pub mod event;
pub mod store;
