#![forbid(unsafe_code)]

use std::iter::FusedIterator;

/// Max chars of message content per notification.
pub const DEFAULT_CHUNK_LIMIT: usize = 123;

/// Split `text` into parts of at most `limit` chars.
///
/// A single part is returned untouched. When more than one part is needed every
/// part gets a ` [i/total]` suffix; the suffix does not count against `limit`.
/// Empty text yields one empty part. A zero `limit` is treated as 1.
pub fn chunk_message(text: &str, limit: usize) -> Chunks<'_> {
	let limit = limit.max(1);
	let chars = text.chars().count();
	let total = if chars == 0 { 1 } else { chars.div_ceil(limit) };
	Chunks {
		rest: text,
		limit,
		index: 0,
		total,
	}
}

/// Lazy chunk sequence returned by [`chunk_message`]. Clone it to restart.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
	rest: &'a str,
	limit: usize,
	index: usize,
	total: usize,
}

impl Chunks<'_> {
	/// Number of parts the text splits into.
	pub fn total(&self) -> usize {
		self.total
	}
}

impl Iterator for Chunks<'_> {
	type Item = String;

	fn next(&mut self) -> Option<String> {
		if self.index >= self.total {
			return None;
		}

		let at = self
			.rest
			.char_indices()
			.nth(self.limit)
			.map(|(i, _)| i)
			.unwrap_or(self.rest.len());
		let (part, rest) = self.rest.split_at(at);
		self.rest = rest;
		self.index += 1;

		if self.total > 1 {
			Some(format!("{part} [{}/{}]", self.index, self.total))
		} else {
			Some(part.to_string())
		}
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let left = self.total - self.index;
		(left, Some(left))
	}
}

impl ExactSizeIterator for Chunks<'_> {}

impl FusedIterator for Chunks<'_> {}
