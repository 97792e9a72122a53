#![forbid(unsafe_code)]

use std::time::Duration;

use kickntfy_domain::NotificationJob;
use tracing::{debug, info, warn};

use super::NotificationSink;
use crate::pipeline::NotificationRx;

/// Gap between deliveries inside a burst.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
	/// Wait applied after a delivery when another job is already queued.
	pub send_delay: Duration,
}

impl Default for DeliveryConfig {
	fn default() -> Self {
		Self {
			send_delay: DEFAULT_SEND_DELAY,
		}
	}
}

/// Single consumer of the notification queue.
///
/// Jobs go out one at a time in queue order. Back-to-back jobs are spaced by
/// `send_delay`; the first job after the queue ran dry goes out immediately.
/// Failed deliveries are logged and dropped.
pub struct DeliveryWorker<S> {
	rx: NotificationRx,
	sink: S,
	cfg: DeliveryConfig,
}

impl<S: NotificationSink> DeliveryWorker<S> {
	pub fn new(rx: NotificationRx, sink: S, cfg: DeliveryConfig) -> Self {
		Self { rx, sink, cfg }
	}

	/// Runs until every producer is gone and the queue is drained.
	pub async fn run(mut self) {
		info!(send_delay = ?self.cfg.send_delay, "delivery worker started");

		while let Some(job) = self.rx.pull().await {
			self.deliver(&job).await;

			if self.rx.has_pending() {
				debug!(pending = self.rx.len(), "burst in progress; delaying next delivery");
				tokio::time::sleep(self.cfg.send_delay).await;
			}
		}

		info!("delivery worker stopped (notification queue closed)");
	}

	async fn deliver(&self, job: &NotificationJob) {
		match self.sink.deliver(job).await {
			Ok(()) => {
				metrics::counter!("kickntfy_notifications_sent_total").increment(1);
				debug!(origin = %job.origin, "notification delivered");
			}
			Err(err) => {
				metrics::counter!("kickntfy_notifications_failed_total").increment(1);
				warn!(origin = %job.origin, error = %err, "notification delivery failed; dropping");
			}
		}
	}
}
