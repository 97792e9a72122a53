#![forbid(unsafe_code)]

mod chunker;
mod dedup;
mod queue;

pub use chunker::{Chunks, DEFAULT_CHUNK_LIMIT, chunk_message};
pub use dedup::DuplicateFilter;
pub use queue::{NotificationRx, NotificationTx, QueueClosed, notification_queue};
