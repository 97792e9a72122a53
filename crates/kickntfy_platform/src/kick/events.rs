#![forbid(unsafe_code)]

use kickntfy_domain::ChatEvent;
use serde::Deserialize;
use thiserror::Error;

use super::pusher::PusherEnvelope;

pub const CHAT_MESSAGE_EVENT: &str = "App\\Events\\ChatMessageEvent";
pub const SUBSCRIPTION_EVENT: &str = "App\\Events\\SubscriptionEvent";
pub const GIFTED_SUB_EVENT: &str = "App\\Events\\GiftedSubEvent";
pub const TIP_EVENT: &str = "App\\Events\\TipEvent";
pub const RAID_EVENT: &str = "App\\Events\\RaidEvent";
pub const STICKER_EVENT: &str = "App\\Events\\StickerEvent";

/// A known event whose payload could not be decoded.
#[derive(Debug, Error)]
#[error("{event}: invalid payload: {source}")]
pub struct EventDecodeError {
	pub event: String,
	#[source]
	pub source: serde_json::Error,
}

#[derive(Debug, Deserialize)]
struct KickUser {
	username: String,
}

#[derive(Debug, Deserialize)]
struct ChatMessagePayload {
	sender: KickUser,
	content: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionPayload {
	user: KickUser,
	months: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GiftedSubPayload {
	gifter: KickUser,
	gift_count: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TipPayload {
	sender: KickUser,
	amount: Option<serde_json::Value>,
	currency: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RaidPayload {
	raider: KickUser,
	viewer_count: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StickerPayload {
	sender: KickUser,
	sticker: KickSticker,
}

#[derive(Debug, Deserialize)]
struct KickSticker {
	name: String,
}

/// Display text of a loosely typed payload field. Strings are used as-is,
/// numbers keep their wire formatting, absent or null takes `default`.
fn scalar_text(value: Option<serde_json::Value>, default: &str) -> String {
	match value {
		None | Some(serde_json::Value::Null) => default.to_string(),
		Some(serde_json::Value::String(s)) => s,
		Some(other) => other.to_string(),
	}
}

/// Map an envelope to a [`ChatEvent`]. Unrecognised tags become `ChatEvent::Unknown`.
pub fn decode_event(envelope: &PusherEnvelope) -> Result<ChatEvent, EventDecodeError> {
	let err = |source| EventDecodeError {
		event: envelope.event.clone(),
		source,
	};

	let event = match envelope.event.as_str() {
		CHAT_MESSAGE_EVENT => {
			let p: ChatMessagePayload = envelope.payload().map_err(err)?;
			ChatEvent::Message {
				username: p.sender.username,
				content: p.content,
			}
		}
		SUBSCRIPTION_EVENT => {
			let p: SubscriptionPayload = envelope.payload().map_err(err)?;
			ChatEvent::Subscription {
				username: p.user.username,
				months: scalar_text(p.months, "1"),
			}
		}
		GIFTED_SUB_EVENT => {
			let p: GiftedSubPayload = envelope.payload().map_err(err)?;
			ChatEvent::GiftedSub {
				gifter: p.gifter.username,
				gift_count: scalar_text(p.gift_count, "1"),
			}
		}
		TIP_EVENT => {
			let p: TipPayload = envelope.payload().map_err(err)?;
			ChatEvent::Tip {
				username: p.sender.username,
				amount: scalar_text(p.amount, "0"),
				currency: scalar_text(p.currency, "USD"),
			}
		}
		RAID_EVENT => {
			let p: RaidPayload = envelope.payload().map_err(err)?;
			ChatEvent::Raid {
				raider: p.raider.username,
				viewer_count: scalar_text(p.viewer_count, "0"),
			}
		}
		STICKER_EVENT => {
			let p: StickerPayload = envelope.payload().map_err(err)?;
			ChatEvent::Sticker {
				username: p.sender.username,
				sticker: p.sticker.name,
			}
		}
		other => ChatEvent::Unknown {
			event: other.to_string(),
		},
	};

	Ok(event)
}
