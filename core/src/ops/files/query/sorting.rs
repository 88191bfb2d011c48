//! Ordering of listing entries

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::FileEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
	#[default]
	Name,
	Size,
	/// Directories first, then by type string
	Type,
	Modified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	#[default]
	#[serde(alias = "asc")]
	Ascending,
	#[serde(alias = "desc")]
	Descending,
}

/// Numeric-aware comparison: `2.txt` sorts before `10.txt`
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
	let mut left = Chunks { rest: a };
	let mut right = Chunks { rest: b };

	loop {
		match (left.next(), right.next()) {
			(None, None) => return a.cmp(b),
			(None, Some(_)) => return Ordering::Less,
			(Some(_), None) => return Ordering::Greater,
			(Some(x), Some(y)) => match compare_chunks(x, y) {
				Ordering::Equal => continue,
				ord => return ord,
			},
		}
	}
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
	let x_digits = x.starts_with(|c: char| c.is_ascii_digit());
	let y_digits = y.starts_with(|c: char| c.is_ascii_digit());

	match (x_digits, y_digits) {
		(true, true) => {
			let x = x.trim_start_matches('0');
			let y = y.trim_start_matches('0');
			x.len().cmp(&y.len()).then_with(|| x.cmp(y))
		}
		(true, false) => Ordering::Less,
		(false, true) => Ordering::Greater,
		(false, false) => x.to_lowercase().cmp(&y.to_lowercase()),
	}
}

/// Alternating runs of digits and non-digits
struct Chunks<'a> {
	rest: &'a str,
}

impl<'a> Iterator for Chunks<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<&'a str> {
		let first = self.rest.chars().next()?;
		let digits = first.is_ascii_digit();
		let end = self
			.rest
			.char_indices()
			.find(|(_, c)| c.is_ascii_digit() != digits)
			.map(|(idx, _)| idx)
			.unwrap_or(self.rest.len());
		let (chunk, rest) = self.rest.split_at(end);
		self.rest = rest;
		Some(chunk)
	}
}

pub fn sort_entries(entries: &mut [FileEntry], by: SortBy, order: SortOrder) {
	entries.sort_by(|a, b| {
		let primary = match by {
			SortBy::Name => natural_cmp(&a.name, &b.name),
			SortBy::Size => a.size.cmp(&b.size),
			SortBy::Modified => a.modified.cmp(&b.modified),
			SortBy::Type => b
				.is_directory()
				.cmp(&a.is_directory())
				.then_with(|| a.kind.cmp(&b.kind)),
		};
		let primary = match order {
			SortOrder::Ascending => primary,
			SortOrder::Descending => primary.reverse(),
		};
		primary.then_with(|| natural_cmp(&a.name, &b.name))
	});
}
