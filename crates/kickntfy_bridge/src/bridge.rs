#![forbid(unsafe_code)]

use anyhow::Context as _;
use kickntfy_platform::{
	DeliveryConfig, DeliveryWorker, EventRouter, NotificationRx, NotificationSink, StreamSession, StreamSessionConfig,
	notification_queue,
};
use tracing::{info, warn};

use crate::config::BridgeConfig;

/// Owns the process-wide pipeline state: the notification queue and the
/// event router (with its duplicate cache), plus both loops around them.
pub struct Bridge {
	session: StreamSession,
	jobs: NotificationRx,
	delivery: DeliveryConfig,
}

impl Bridge {
	pub fn new(cfg: &BridgeConfig) -> Self {
		let (tx, rx) = notification_queue();

		let session_cfg = StreamSessionConfig {
			ws_url: cfg.ws_url.clone(),
			chatroom: cfg.chatroom.clone(),
			reconnect_delay: cfg.reconnect_delay,
			ping_interval: cfg.ping_interval,
			ping_timeout: cfg.ping_timeout,
		};
		let router = EventRouter::new(cfg.chunk_limit);

		Self {
			session: StreamSession::new(session_cfg, router, tx),
			jobs: rx,
			delivery: DeliveryConfig {
				send_delay: cfg.send_delay,
			},
		}
	}

	/// Start the delivery worker and run the stream session on this task.
	///
	/// Only returns if the delivery side goes away.
	pub async fn run<S>(self, sink: S) -> anyhow::Result<()>
	where
		S: NotificationSink + 'static,
	{
		let Self { session, jobs, delivery } = self;

		let worker = tokio::spawn(DeliveryWorker::new(jobs, sink, delivery).run());
		info!("🚀 bridge running");

		session.run().await;

		warn!("stream session stopped; waiting for delivery worker");
		worker.await.context("delivery worker task")?;
		Ok(())
	}
}
