#![forbid(unsafe_code)]

pub mod kick;
pub mod ntfy;
pub mod pipeline;

use uuid::Uuid;

pub use kick::{EventRouter, SessionEnd, StreamSession, StreamSessionConfig};
pub use ntfy::{DeliveryConfig, DeliveryWorker, NotificationSink, NtfyClient};
pub use pipeline::{DuplicateFilter, NotificationRx, NotificationTx, chunk_message, notification_queue};

/// Generate an opaque session id.
pub fn new_session_id() -> String {
	Uuid::new_v4().to_string()
}
