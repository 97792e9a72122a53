#![forbid(unsafe_code)]

use kickntfy_domain::NotificationJob;
use thiserror::Error;
use tokio::sync::mpsc;

/// The delivery side of the queue is gone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notification queue closed")]
pub struct QueueClosed(pub NotificationJob);

/// Create the unbounded FIFO connecting the stream session to the delivery worker.
pub fn notification_queue() -> (NotificationTx, NotificationRx) {
	let (tx, rx) = mpsc::unbounded_channel();
	(NotificationTx { tx }, NotificationRx { rx })
}

/// Producer handle. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationTx {
	tx: mpsc::UnboundedSender<NotificationJob>,
}

impl NotificationTx {
	/// Enqueue without waiting. Fails only if the consumer was dropped.
	pub fn push(&self, job: NotificationJob) -> Result<(), QueueClosed> {
		self.tx.send(job).map_err(|e| QueueClosed(e.0))
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

/// Consumer handle. There is exactly one.
#[derive(Debug)]
pub struct NotificationRx {
	rx: mpsc::UnboundedReceiver<NotificationJob>,
}

impl NotificationRx {
	/// Wait for the next job. `None` once every producer is dropped and the queue is drained.
	pub async fn pull(&mut self) -> Option<NotificationJob> {
		self.rx.recv().await
	}

	/// Whether a job is waiting right now.
	///
	/// As the only consumer, a `true` here guarantees the next [`pull`](Self::pull)
	/// returns immediately.
	pub fn has_pending(&self) -> bool {
		!self.rx.is_empty()
	}

	pub fn len(&self) -> usize {
		self.rx.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rx.is_empty()
	}
}
