use std::time::SystemTime;

use chrono::{DateTime, Utc};

pub mod error;

/// Milliseconds since the unix epoch for a filesystem timestamp.
///
/// Timestamps before the epoch clamp to zero.
pub fn system_time_to_millis(time: SystemTime) -> i64 {
	DateTime::<Utc>::from(time).timestamp_millis().max(0)
}

pub fn now_millis() -> i64 {
	Utc::now().timestamp_millis()
}
