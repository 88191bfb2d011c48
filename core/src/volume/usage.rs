//! Disk usage for the filesystem holding a path
//!
//! Capacity is answered by whatever manages the disks; the default provider asks
//! `df` the same way a shell user would.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::{trace, warn};

use crate::common::{FilesError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskUsage {
	pub size: u64,
	pub total_used: u64,
	pub available: u64,
}

#[async_trait]
pub trait DiskUsageProvider: Send + Sync {
	async fn usage(&self, path: &Path) -> Result<DiskUsage>;
}

/// Queries `df` for the filesystem containing the path
#[derive(Debug, Default)]
pub struct DfDiskUsage;

#[async_trait]
impl DiskUsageProvider for DfDiskUsage {
	async fn usage(&self, path: &Path) -> Result<DiskUsage> {
		let output = Command::new("df")
			.arg("-P")
			.arg("-k")
			.arg(path)
			.kill_on_drop(true)
			.output()
			.await
			.map_err(|e| FilesError::command("df", e.to_string()))?;

		if !output.status.success() {
			return Err(FilesError::command(
				"df",
				String::from_utf8_lossy(&output.stderr).trim().to_string(),
			));
		}

		let stdout = String::from_utf8_lossy(&output.stdout);
		trace!("df output for {}: {stdout}", path.display());
		parse_df_output(&stdout)
			.ok_or_else(|| FilesError::command("df", format!("unexpected output: {stdout}")))
	}
}

/// Parse `df -P -k` output: a header line, then
/// `filesystem blocks used available capacity mountpoint`
pub fn parse_df_output(output: &str) -> Option<DiskUsage> {
	let line = output.lines().skip(1).find(|line| !line.trim().is_empty())?;
	let fields = line.split_whitespace().collect::<Vec<_>>();
	if fields.len() < 6 {
		return None;
	}

	// The filesystem name may contain spaces, so count columns from the end
	let n = fields.len();
	Some(DiskUsage {
		size: parse_size_string(&format!("{}K", fields[n - 5]))?,
		total_used: parse_size_string(&format!("{}K", fields[n - 4]))?,
		available: parse_size_string(&format!("{}K", fields[n - 3]))?,
	})
}

/// Parse size strings from df output (e.g., "1.5G", "931Gi", "1024K")
pub fn parse_size_string(size_str: &str) -> Option<u64> {
	if size_str == "-" {
		return Some(0);
	}

	let size_str = size_str.replace(',', "");
	let (number_part, unit) = match size_str.find(char::is_alphabetic) {
		Some(pos) => (&size_str[..pos], &size_str[pos..]),
		None => (size_str.as_str(), ""),
	};

	let number: f64 = number_part.parse().ok()?;

	let multiplier = match unit.to_uppercase().as_str() {
		"" | "B" => 1,
		"K" | "KB" | "KI" => 1024,
		"M" | "MB" | "MI" => 1024 * 1024,
		"G" | "GB" | "GI" => 1024 * 1024 * 1024,
		"T" | "TB" | "TI" => 1024u64.pow(4),
		"P" | "PB" | "PI" => 1024u64.pow(5),
		_ => {
			warn!("Unknown size unit: {}", unit);
			1
		}
	};

	Some((number * multiplier as f64) as u64)
}
