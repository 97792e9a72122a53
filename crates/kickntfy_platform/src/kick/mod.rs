#![forbid(unsafe_code)]

mod events;
mod pusher;
mod router;
mod session;

pub use events::{
	CHAT_MESSAGE_EVENT, EventDecodeError, GIFTED_SUB_EVENT, RAID_EVENT, STICKER_EVENT, SUBSCRIPTION_EVENT, TIP_EVENT,
	decode_event,
};
pub use pusher::{PusherEnvelope, pong_frame, subscribe_frame};
pub use router::{EventRouter, FrameError, notification_text};
pub use session::{
	DEFAULT_PING_INTERVAL, DEFAULT_PING_TIMEOUT, DEFAULT_RECONNECT_DELAY, SessionEnd, StreamSession, StreamSessionConfig,
};
