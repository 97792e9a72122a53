#![forbid(unsafe_code)]

#[cfg(test)]
mod config_tests;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use kickntfy_domain::ChatroomId;
use kickntfy_platform::kick::{DEFAULT_PING_INTERVAL, DEFAULT_PING_TIMEOUT, DEFAULT_RECONNECT_DELAY};
use kickntfy_platform::ntfy::{DEFAULT_HTTP_TIMEOUT, DEFAULT_SEND_DELAY};
use kickntfy_platform::pipeline::DEFAULT_CHUNK_LIMIT;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

pub const CHATROOM_ID_ENV: &str = "CHATROOM_ID";
pub const WS_URL_ENV: &str = "WS_URL";
pub const NTFY_TOPIC_ENV: &str = "NTFY_TOPIC";
pub const CONFIG_PATH_ENV: &str = "KICKNTFY_CONFIG";

/// Default config path: `~/.kickntfy/config.toml`.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
	let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
	Ok(home.join(".kickntfy").join("config.toml"))
}

/// `KICKNTFY_CONFIG` if set, else the default path.
pub fn config_path() -> anyhow::Result<PathBuf> {
	match std::env::var(CONFIG_PATH_ENV) {
		Ok(v) if !v.trim().is_empty() => Ok(PathBuf::from(v.trim())),
		_ => default_config_path(),
	}
}

/// Load the bridge config from TOML and process env overrides.
pub fn load_bridge_config_from_path(path: &Path) -> anyhow::Result<BridgeConfig> {
	load_bridge_config_with(path, |key| std::env::var(key).ok())
}

/// Same as `load_bridge_config_from_path` with an explicit env lookup.
pub fn load_bridge_config_with<F>(path: &Path, lookup: F) -> anyhow::Result<BridgeConfig>
where
	F: Fn(&str) -> Option<String>,
{
	let file_cfg = read_toml_if_exists(path)
		.with_context(|| format!("read config from {}", path.display()))?
		.unwrap_or_default();

	let mut settings = BridgeSettings::from_file(file_cfg);

	apply_env_overrides_from(&mut settings, lookup);

	settings.resolve()
}

/// Validated configuration the bridge starts from.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
	pub chatroom: ChatroomId,
	/// Pusher websocket URL (`ws://` or `wss://`).
	pub ws_url: String,
	/// Full ntfy topic URL notifications are POSTed to.
	pub ntfy_url: String,
	pub chunk_limit: usize,
	pub send_delay: Duration,
	pub reconnect_delay: Duration,
	pub ping_interval: Duration,
	pub ping_timeout: Duration,
	pub http_timeout: Duration,
	/// Optional metrics exporter bind address (host:port).
	pub metrics_bind: Option<String>,
}

/// Settings as merged from file and env, before validation.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
	pub chatroom_id: Option<String>,
	pub ws_url: Option<String>,
	pub ntfy_url: Option<String>,
	pub chunk_limit: usize,
	pub send_delay: Duration,
	pub reconnect_delay: Duration,
	pub ping_interval: Duration,
	pub ping_timeout: Duration,
	pub http_timeout: Duration,
	pub metrics_bind: Option<String>,
}

impl Default for BridgeSettings {
	fn default() -> Self {
		Self {
			chatroom_id: None,
			ws_url: None,
			ntfy_url: None,
			chunk_limit: DEFAULT_CHUNK_LIMIT,
			send_delay: DEFAULT_SEND_DELAY,
			reconnect_delay: DEFAULT_RECONNECT_DELAY,
			ping_interval: DEFAULT_PING_INTERVAL,
			ping_timeout: DEFAULT_PING_TIMEOUT,
			http_timeout: DEFAULT_HTTP_TIMEOUT,
			metrics_bind: None,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
	metrics_bind: Option<String>,

	#[serde(default)]
	kick: FileKickSettings,

	#[serde(default)]
	ntfy: FileNtfySettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileKickSettings {
	chatroom_id: Option<String>,
	ws_url: Option<String>,
	reconnect_delay_ms: Option<u64>,
	ping_interval_secs: Option<u64>,
	ping_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileNtfySettings {
	topic_url: Option<String>,
	chunk_limit: Option<usize>,
	send_delay_ms: Option<u64>,
	http_timeout_secs: Option<u64>,
}

impl BridgeSettings {
	fn from_file(file: FileConfig) -> Self {
		let defaults = Self::default();
		Self {
			chatroom_id: file.kick.chatroom_id.filter(|s| !s.trim().is_empty()),
			ws_url: file.kick.ws_url.filter(|s| !s.trim().is_empty()),
			ntfy_url: file.ntfy.topic_url.filter(|s| !s.trim().is_empty()),
			chunk_limit: file.ntfy.chunk_limit.filter(|v| *v > 0).unwrap_or(defaults.chunk_limit),
			send_delay: file
				.ntfy
				.send_delay_ms
				.map(Duration::from_millis)
				.unwrap_or(defaults.send_delay),
			reconnect_delay: file
				.kick
				.reconnect_delay_ms
				.map(Duration::from_millis)
				.unwrap_or(defaults.reconnect_delay),
			ping_interval: file
				.kick
				.ping_interval_secs
				.filter(|v| *v > 0)
				.map(Duration::from_secs)
				.unwrap_or(defaults.ping_interval),
			ping_timeout: file
				.kick
				.ping_timeout_secs
				.filter(|v| *v > 0)
				.map(Duration::from_secs)
				.unwrap_or(defaults.ping_timeout),
			http_timeout: file
				.ntfy
				.http_timeout_secs
				.filter(|v| *v > 0)
				.map(Duration::from_secs)
				.unwrap_or(defaults.http_timeout),
			metrics_bind: file.metrics_bind.filter(|s| !s.trim().is_empty()),
		}
	}

	/// Check required values. Any failure here is startup-fatal.
	pub fn resolve(self) -> anyhow::Result<BridgeConfig> {
		let chatroom_id = self
			.chatroom_id
			.ok_or_else(|| anyhow!("{CHATROOM_ID_ENV} is not set (or kick.chatroom_id in config)"))?;
		let chatroom =
			ChatroomId::new(chatroom_id).with_context(|| format!("invalid chatroom id ({CHATROOM_ID_ENV})"))?;

		let ws_url = self
			.ws_url
			.ok_or_else(|| anyhow!("{WS_URL_ENV} is not set (or kick.ws_url in config)"))?;
		parse_url_with_scheme(&ws_url, WS_URL_ENV, &["ws", "wss"])?;

		let ntfy_url = self
			.ntfy_url
			.ok_or_else(|| anyhow!("{NTFY_TOPIC_ENV} is not set (or ntfy.topic_url in config)"))?;
		parse_url_with_scheme(&ntfy_url, NTFY_TOPIC_ENV, &["http", "https"])?;

		Ok(BridgeConfig {
			chatroom,
			ws_url,
			ntfy_url,
			chunk_limit: self.chunk_limit,
			send_delay: self.send_delay,
			reconnect_delay: self.reconnect_delay,
			ping_interval: self.ping_interval,
			ping_timeout: self.ping_timeout,
			http_timeout: self.http_timeout,
			metrics_bind: self.metrics_bind,
		})
	}
}

fn parse_url_with_scheme(raw: &str, key: &str, schemes: &[&str]) -> anyhow::Result<()> {
	let url = Url::parse(raw).with_context(|| format!("parse {key} url"))?;
	if !schemes.contains(&url.scheme()) {
		return Err(anyhow!(
			"invalid {key}: scheme must be one of {}, got {}",
			schemes.join("/"),
			url.scheme()
		));
	}
	if url.host_str().is_none_or(str::is_empty) {
		return Err(anyhow!("invalid {key}: missing host"));
	}
	Ok(())
}

fn read_toml_if_exists(path: &Path) -> anyhow::Result<Option<FileConfig>> {
	match fs::read_to_string(path) {
		Ok(s) => {
			let cfg: FileConfig = toml::from_str(&s).context("parse TOML")?;
			Ok(Some(cfg))
		}
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
		Err(e) => Err(anyhow!(e).context("read config file")),
	}
}

fn env_string<F>(lookup: &F, key: &str) -> Option<String>
where
	F: Fn(&str) -> Option<String>,
{
	lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_u64<F>(lookup: &F, key: &str) -> Option<u64>
where
	F: Fn(&str) -> Option<String>,
{
	let raw = env_string(lookup, key)?;
	match raw.parse::<u64>() {
		Ok(v) => Some(v),
		Err(_) => {
			warn!(key, value = %raw, "ignoring non-numeric env override");
			None
		}
	}
}

pub fn apply_env_overrides_from<F>(cfg: &mut BridgeSettings, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(v) = env_string(&lookup, CHATROOM_ID_ENV) {
		cfg.chatroom_id = Some(v);
		info!("kick config: chatroom_id overridden by env");
	}

	if let Some(v) = env_string(&lookup, WS_URL_ENV) {
		cfg.ws_url = Some(v);
		info!("kick config: ws_url overridden by env");
	}

	if let Some(v) = env_string(&lookup, NTFY_TOPIC_ENV) {
		cfg.ntfy_url = Some(v);
		info!("ntfy config: topic_url overridden by env");
	}

	if let Some(limit) = env_u64(&lookup, "KICKNTFY_CHUNK_LIMIT").filter(|v| *v > 0) {
		cfg.chunk_limit = usize::try_from(limit).unwrap_or(usize::MAX);
		info!(limit, "ntfy config: chunk_limit overridden by env");
	}

	if let Some(ms) = env_u64(&lookup, "KICKNTFY_SEND_DELAY_MS") {
		cfg.send_delay = Duration::from_millis(ms);
		info!(ms, "ntfy config: send_delay overridden by env");
	}

	if let Some(ms) = env_u64(&lookup, "KICKNTFY_RECONNECT_DELAY_MS") {
		cfg.reconnect_delay = Duration::from_millis(ms);
		info!(ms, "kick config: reconnect_delay overridden by env");
	}

	if let Some(secs) = env_u64(&lookup, "KICKNTFY_PING_INTERVAL_SECS").filter(|v| *v > 0) {
		cfg.ping_interval = Duration::from_secs(secs);
		debug!(secs, "kick config: ping_interval overridden by env");
	}

	if let Some(secs) = env_u64(&lookup, "KICKNTFY_PING_TIMEOUT_SECS").filter(|v| *v > 0) {
		cfg.ping_timeout = Duration::from_secs(secs);
		debug!(secs, "kick config: ping_timeout overridden by env");
	}

	if let Some(secs) = env_u64(&lookup, "KICKNTFY_HTTP_TIMEOUT_SECS").filter(|v| *v > 0) {
		cfg.http_timeout = Duration::from_secs(secs);
		debug!(secs, "ntfy config: http_timeout overridden by env");
	}

	if let Some(v) = env_string(&lookup, "KICKNTFY_METRICS_BIND") {
		cfg.metrics_bind = Some(v);
		info!("bridge config: metrics_bind overridden by env");
	}
}
