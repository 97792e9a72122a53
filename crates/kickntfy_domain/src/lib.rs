#![forbid(unsafe_code)]

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for parsing identifiers from strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseIdError {
	#[error("empty value")]
	Empty,
	#[error("invalid format: {0}")]
	InvalidFormat(String),
}

/// Kick chatroom identifier (the `{id}` in `chatrooms.{id}.v2`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatroomId(String);

impl ChatroomId {
	/// Create a non-empty `ChatroomId` that is safe to embed in a channel name.
	pub fn new(id: impl Into<String>) -> Result<Self, ParseIdError> {
		let id = id.into();
		let id = id.trim();
		if id.is_empty() {
			return Err(ParseIdError::Empty);
		}
		if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
			return Err(ParseIdError::InvalidFormat(format!("chatroom id: {id}")));
		}
		Ok(Self(id.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Pusher channel carrying this chatroom's events.
	pub fn channel(&self) -> String {
		format!("chatrooms.{}.v2", self.0)
	}
}

impl fmt::Display for ChatroomId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for ChatroomId {
	type Err = ParseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ChatroomId::new(s.to_string())
	}
}

/// Chat events that can produce notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
	Message {
		username: String,
		content: String,
	},
	Subscription {
		username: String,
		/// Count as it appeared on the wire; `1` when absent.
		months: String,
	},
	GiftedSub {
		gifter: String,
		gift_count: String,
	},
	Tip {
		username: String,
		/// Amount as it appeared on the wire (`5`, `4.99`).
		amount: String,
		currency: String,
	},
	Raid {
		raider: String,
		viewer_count: String,
	},
	Sticker {
		username: String,
		sticker: String,
	},
	/// Any event tag we do not translate.
	Unknown {
		event: String,
	},
}

impl ChatEvent {
	/// The acting user (sender, gifter, raider), if the event has one.
	pub fn origin(&self) -> Option<&str> {
		match self {
			ChatEvent::Message { username, .. }
			| ChatEvent::Subscription { username, .. }
			| ChatEvent::Tip { username, .. }
			| ChatEvent::Sticker { username, .. } => Some(username),
			ChatEvent::GiftedSub { gifter, .. } => Some(gifter),
			ChatEvent::Raid { raider, .. } => Some(raider),
			ChatEvent::Unknown { .. } => None,
		}
	}

	/// Stable short name, used in logs and metrics labels.
	pub const fn kind(&self) -> &'static str {
		match self {
			ChatEvent::Message { .. } => "message",
			ChatEvent::Subscription { .. } => "subscription",
			ChatEvent::GiftedSub { .. } => "gifted_sub",
			ChatEvent::Tip { .. } => "tip",
			ChatEvent::Raid { .. } => "raid",
			ChatEvent::Sticker { .. } => "sticker",
			ChatEvent::Unknown { .. } => "unknown",
		}
	}
}

/// One push notification waiting for delivery: `(origin, text)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationJob {
	/// Sent as the notification title.
	pub origin: String,
	/// Sent as the notification body.
	pub text: String,
}

impl NotificationJob {
	pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			origin: origin.into(),
			text: text.into(),
		}
	}
}

impl fmt::Display for NotificationJob {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}] {}", self.origin, self.text)
	}
}
