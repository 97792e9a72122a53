#![forbid(unsafe_code)]

mod client;
mod worker;


use std::sync::Arc;

use async_trait::async_trait;
use kickntfy_domain::NotificationJob;

pub use client::{DEFAULT_HTTP_TIMEOUT, NtfyClient};
pub use worker::{DEFAULT_SEND_DELAY, DeliveryConfig, DeliveryWorker};

/// Destination for notification jobs.
#[async_trait]
pub trait NotificationSink: Send + Sync {
	/// Make one delivery attempt.
	async fn deliver(&self, job: &NotificationJob) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
	async fn deliver(&self, job: &NotificationJob) -> anyhow::Result<()> {
		(**self).deliver(job).await
	}
}
