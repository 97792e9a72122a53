#![forbid(unsafe_code)]

mod bridge;
mod config;

use kickntfy_platform::NtfyClient;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::bridge::Bridge;

fn init_tracing() {
	let filter =
		std::env::var("RUST_LOG").unwrap_or_else(|_| "info,kickntfy_bridge=debug,kickntfy_platform=info".to_string());

	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::new(filter))
		.with(tracing_subscriber::fmt::layer().with_target(false))
		.init();
}

fn init_metrics(bind: Option<&str>) {
	let Some(bind) = bind else {
		return;
	};

	match bind.parse::<std::net::SocketAddr>() {
		Ok(addr) => {
			if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
				.with_http_listener(addr)
				.install()
			{
				warn!(error = %e, "failed to start metrics exporter");
			} else {
				info!(%addr, "metrics exporter listening");
			}
		}
		Err(e) => {
			warn!(error = %e, %bind, "invalid metrics bind address (expected host:port)");
		}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	init_tracing();

	let config_path = crate::config::config_path()?;
	let cfg = match crate::config::load_bridge_config_from_path(&config_path) {
		Ok(cfg) => cfg,
		Err(e) => {
			error!(error = %format!("{e:#}"), "startup configuration failed");
			return Err(e);
		}
	};
	info!(
		path = %config_path.display(),
		chatroom = %cfg.chatroom,
		ntfy = %cfg.ntfy_url,
		"loaded bridge config (toml + env overrides)"
	);

	init_metrics(cfg.metrics_bind.as_deref());

	let sink = NtfyClient::new(cfg.ntfy_url.clone(), cfg.http_timeout)?;
	let bridge = Bridge::new(&cfg);

	tokio::select! {
		res = bridge.run(sink) => res,
		_ = tokio::signal::ctrl_c() => {
			info!("ctrl-c received; shutting down");
			Ok(())
		}
	}
}
