#![forbid(unsafe_code)]

use kickntfy_domain::{ChatEvent, NotificationJob};
use thiserror::Error;
use tracing::{debug, info};

use super::events::{EventDecodeError, decode_event};
use super::pusher::PusherEnvelope;
use crate::pipeline::{DEFAULT_CHUNK_LIMIT, DuplicateFilter, chunk_message};

/// Why an inbound frame produced nothing.
#[derive(Debug, Error)]
pub enum FrameError {
	#[error("invalid frame: {0}")]
	Frame(#[source] serde_json::Error),
	#[error(transparent)]
	Payload(#[from] EventDecodeError),
}

/// Display text for a non-chat event.
pub fn notification_text(event: &ChatEvent) -> Option<String> {
	match event {
		ChatEvent::Subscription { months, .. } => Some(format!("🎉 Subscribed for {months} month(s)!")),
		ChatEvent::GiftedSub { gift_count, .. } => Some(format!("🎁 Gifted {gift_count} sub(s)!")),
		ChatEvent::Tip { amount, currency, .. } => Some(format!("💸 Tipped {amount} {currency}")),
		ChatEvent::Raid { viewer_count, .. } => Some(format!("⚡ Raided with {viewer_count} viewers!")),
		ChatEvent::Sticker { sticker, .. } => Some(format!("🌟 Sent sticker: {sticker}")),
		ChatEvent::Message { .. } | ChatEvent::Unknown { .. } => None,
	}
}

/// Turns inbound chat events into notification jobs.
///
/// Owns the duplicate filter, so one router should live for the whole process
/// and be reused across reconnects.
#[derive(Debug)]
pub struct EventRouter {
	dedup: DuplicateFilter,
	chunk_limit: usize,
}

impl Default for EventRouter {
	fn default() -> Self {
		Self::new(DEFAULT_CHUNK_LIMIT)
	}
}

impl EventRouter {
	pub fn new(chunk_limit: usize) -> Self {
		Self {
			dedup: DuplicateFilter::new(),
			chunk_limit,
		}
	}

	pub fn chunk_limit(&self) -> usize {
		self.chunk_limit
	}

	pub fn filter(&self) -> &DuplicateFilter {
		&self.dedup
	}

	/// Decode a raw text frame and classify it.
	pub fn route_frame(&mut self, raw: &str) -> Result<Vec<NotificationJob>, FrameError> {
		let envelope = PusherEnvelope::parse(raw).map_err(FrameError::Frame)?;
		Ok(self.route_envelope(&envelope)?)
	}

	pub fn route_envelope(&mut self, envelope: &PusherEnvelope) -> Result<Vec<NotificationJob>, EventDecodeError> {
		let event = decode_event(envelope)?;
		Ok(self.classify(event))
	}

	/// Zero jobs for duplicates and unknown events, one per chunk for chat, one otherwise.
	pub fn classify(&mut self, event: ChatEvent) -> Vec<NotificationJob> {
		match event {
			ChatEvent::Message { username, content } => {
				if !self.dedup.accept(&username, &content) {
					debug!(user = %username, "dropping repeated chat message");
					return Vec::new();
				}
				let jobs = chunk_message(&content, self.chunk_limit)
					.map(|part| NotificationJob::new(username.clone(), part))
					.collect();
				info!(user = %username, text = %content, "💬 chat message");
				jobs
			}
			ChatEvent::Unknown { event } => {
				debug!(%event, "ignoring unhandled event");
				Vec::new()
			}
			other => {
				let (Some(origin), Some(text)) = (other.origin(), notification_text(&other)) else {
					return Vec::new();
				};
				info!(kind = other.kind(), user = %origin, text = %text, "chat event");
				vec![NotificationJob::new(origin, text)]
			}
		}
	}
}
