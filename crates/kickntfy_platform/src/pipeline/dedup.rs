#![forbid(unsafe_code)]

use std::collections::HashMap;

/// Suppresses a user's chat message when it repeats that user's previous one.
///
/// Only the single most recent message per user is remembered, and entries are
/// never evicted.
#[derive(Debug, Default)]
pub struct DuplicateFilter {
	last_by_user: HashMap<String, String>,
}

impl DuplicateFilter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `false` if `text` equals `user`'s previous message. Otherwise
	/// records it as the new previous message and returns `true`.
	pub fn accept(&mut self, user: &str, text: &str) -> bool {
		match self.last_by_user.get_mut(user) {
			Some(last) if last == text => false,
			Some(last) => {
				text.clone_into(last);
				true
			}
			None => {
				self.last_by_user.insert(user.to_string(), text.to_string());
				true
			}
		}
	}

	/// Number of users seen so far.
	pub fn len(&self) -> usize {
		self.last_by_user.len()
	}

	pub fn is_empty(&self) -> bool {
		self.last_by_user.is_empty()
	}
}
