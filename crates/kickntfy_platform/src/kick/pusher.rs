#![forbid(unsafe_code)]

use kickntfy_domain::ChatroomId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const CONNECTION_ESTABLISHED: &str = "pusher:connection_established";
pub const SUBSCRIBE: &str = "pusher:subscribe";
pub const SUBSCRIPTION_SUCCEEDED: &str = "pusher_internal:subscription_succeeded";
pub const PING: &str = "pusher:ping";
pub const PONG: &str = "pusher:pong";
pub const ERROR: &str = "pusher:error";

/// Outer Pusher frame: `{"event": ..., "data": ..., "channel": ...}`.
///
/// Event payloads carry `data` as an embedded JSON string; some control frames
/// carry an inline object instead. [`PusherEnvelope::payload`] accepts both.
#[derive(Debug, Clone, Deserialize)]
pub struct PusherEnvelope {
	pub event: String,
	#[serde(default)]
	pub data: Option<serde_json::Value>,
	#[serde(default)]
	pub channel: Option<String>,
}

impl PusherEnvelope {
	pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}

	/// Decode `data` into `T`. Missing or null `data` decodes as `{}`.
	pub fn payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
		match &self.data {
			None | Some(serde_json::Value::Null) => serde_json::from_str("{}"),
			Some(serde_json::Value::String(embedded)) => serde_json::from_str(embedded),
			Some(inline) => T::deserialize(inline),
		}
	}

	/// Pusher protocol frames (`pusher:*`, `pusher_internal:*`).
	pub fn is_control(&self) -> bool {
		self.event.starts_with("pusher:") || self.event.starts_with("pusher_internal:")
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionEstablished {
	#[serde(default)]
	pub socket_id: Option<String>,
	/// Server-suggested inactivity timeout, seconds.
	#[serde(default)]
	pub activity_timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PusherError {
	#[serde(default)]
	pub code: Option<i64>,
	#[serde(default)]
	pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutgoingFrame<T> {
	event: &'static str,
	data: T,
}

#[derive(Debug, Serialize)]
struct SubscribeData {
	auth: String,
	channel: String,
}

#[derive(Debug, Serialize)]
struct Empty {}

/// `pusher:subscribe` request for the chatroom channel (no auth).
pub fn subscribe_frame(chatroom: &ChatroomId) -> String {
	let frame = OutgoingFrame {
		event: SUBSCRIBE,
		data: SubscribeData {
			auth: String::new(),
			channel: chatroom.channel(),
		},
	};
	serde_json::to_string(&frame).unwrap_or_default()
}

/// Reply to a `pusher:ping`.
pub fn pong_frame() -> String {
	let frame = OutgoingFrame {
		event: PONG,
		data: Empty {},
	};
	serde_json::to_string(&frame).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn subscribe_frame_shape() {
		let chatroom = ChatroomId::new("668").unwrap();
		let frame: serde_json::Value = serde_json::from_str(&subscribe_frame(&chatroom)).unwrap();
		assert_eq!(
			frame,
			serde_json::json!({
				"event": "pusher:subscribe",
				"data": {"auth": "", "channel": "chatrooms.668.v2"}
			})
		);
	}

	#[test]
	fn pong_frame_shape() {
		let frame: serde_json::Value = serde_json::from_str(&pong_frame()).unwrap();
		assert_eq!(frame, serde_json::json!({"event": "pusher:pong", "data": {}}));
	}

	#[test]
	fn payload_decodes_embedded_string() {
		let raw = r#"{"event":"pusher:connection_established","data":"{\"socket_id\":\"123.456\",\"activity_timeout\":120}"}"#;
		let env = PusherEnvelope::parse(raw).unwrap();
		assert!(env.is_control());
		let est: ConnectionEstablished = env.payload().unwrap();
		assert_eq!(est.socket_id.as_deref(), Some("123.456"));
		assert_eq!(est.activity_timeout, Some(120));
	}

	#[test]
	fn payload_decodes_inline_object_and_missing_data() {
		let env = PusherEnvelope::parse(r#"{"event":"pusher:error","data":{"code":4200,"message":"reconnect"}}"#).unwrap();
		let err: PusherError = env.payload().unwrap();
		assert_eq!(err.code, Some(4200));
		assert_eq!(err.message.as_deref(), Some("reconnect"));

		let env = PusherEnvelope::parse(r#"{"event":"pusher:ping"}"#).unwrap();
		let err: PusherError = env.payload().unwrap();
		assert_eq!(err.code, None);
	}

	#[test]
	fn undecodable_embedded_payload_is_an_error() {
		let env = PusherEnvelope::parse(r#"{"event":"App\\Events\\ChatMessageEvent","data":"{not json"}"#).unwrap();
		assert!(!env.is_control());
		assert!(env.payload::<ConnectionEstablished>().is_err());
	}

	#[test]
	fn frame_without_event_is_rejected() {
		assert!(PusherEnvelope::parse(r#"{"data":"{}"}"#).is_err());
		assert!(PusherEnvelope::parse("not json").is_err());
	}
}
