#![forbid(unsafe_code)]

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use kickntfy_domain::NotificationJob;
use reqwest::header::HeaderValue;
use tracing::debug;

use super::NotificationSink;

/// Default per-request timeout for publishing.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Publishes plain-text messages to an ntfy topic URL.
#[derive(Debug, Clone)]
pub struct NtfyClient {
	topic_url: String,
	client: reqwest::Client,
}

impl NtfyClient {
	pub fn new(topic_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.context("build ntfy http client")?;
		Ok(Self {
			topic_url: topic_url.into(),
			client,
		})
	}

	/// `POST {topic_url}` with `body` as the message and `title` as the `Title` header.
	pub async fn publish(&self, title: &str, body: &str) -> anyhow::Result<()> {
		let mut req = self.client.post(&self.topic_url).body(body.to_string());

		match HeaderValue::from_bytes(title.as_bytes()) {
			Ok(value) => req = req.header("Title", value),
			Err(_) => debug!(title = %title, "title is not a valid header value; sending without it"),
		}

		let resp = req.send().await.context("ntfy publish")?;

		let status = resp.status();
		if status.is_success() {
			Ok(())
		} else {
			Err(anyhow!("ntfy publish failed: status={}", status))
		}
	}
}

#[async_trait]
impl NotificationSink for NtfyClient {
	async fn deliver(&self, job: &NotificationJob) -> anyhow::Result<()> {
		self.publish(&job.origin, &job.text).await
	}
}
