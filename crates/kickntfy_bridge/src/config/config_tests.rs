#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
	let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
	move |key| map.get(key).cloned()
}

fn missing_path() -> PathBuf {
	std::env::temp_dir().join(format!("kickntfy-missing-{}", std::process::id())).join("config.toml")
}

fn write_config(name: &str, body: &str) -> PathBuf {
	let dir = std::env::temp_dir().join(format!("kickntfy-config-{}-{name}", std::process::id()));
	fs::create_dir_all(&dir).unwrap();
	let path = dir.join("config.toml");
	fs::write(&path, body).unwrap();
	path
}

const REQUIRED: &[(&str, &str)] = &[
	("CHATROOM_ID", "668"),
	("WS_URL", "wss://ws-us2.pusher.com/app/abc?protocol=7&client=js&version=8.4.0"),
	("NTFY_TOPIC", "https://ntfy.sh/kick-alerts"),
];

#[test]
fn env_only_config_uses_defaults_for_tuning() {
	let cfg = load_bridge_config_with(&missing_path(), env(REQUIRED)).unwrap();

	assert_eq!(cfg.chatroom.as_str(), "668");
	assert_eq!(cfg.ws_url, REQUIRED[1].1);
	assert_eq!(cfg.ntfy_url, "https://ntfy.sh/kick-alerts");
	assert_eq!(cfg.chunk_limit, 123);
	assert_eq!(cfg.send_delay, Duration::from_secs(5));
	assert_eq!(cfg.reconnect_delay, Duration::from_secs(5));
	assert_eq!(cfg.ping_interval, Duration::from_secs(20));
	assert_eq!(cfg.ping_timeout, Duration::from_secs(20));
	assert_eq!(cfg.http_timeout, Duration::from_secs(10));
	assert_eq!(cfg.metrics_bind, None);
}

#[test]
fn each_missing_required_value_is_fatal() {
	for skip in ["CHATROOM_ID", "WS_URL", "NTFY_TOPIC"] {
		let pairs: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != skip).collect();
		let err = load_bridge_config_with(&missing_path(), env(&pairs)).unwrap_err();
		assert!(err.to_string().contains(skip), "error for missing {skip}: {err:#}");
	}
}

#[test]
fn blank_required_value_counts_as_missing() {
	let mut pairs = REQUIRED.to_vec();
	pairs[0] = ("CHATROOM_ID", "   ");
	let err = load_bridge_config_with(&missing_path(), env(&pairs)).unwrap_err();
	assert!(err.to_string().contains("CHATROOM_ID"));
}

#[test]
fn invalid_urls_are_rejected() {
	let mut pairs = REQUIRED.to_vec();
	pairs[1] = ("WS_URL", "https://not-a-websocket.example");
	assert!(load_bridge_config_with(&missing_path(), env(&pairs)).is_err());

	let mut pairs = REQUIRED.to_vec();
	pairs[2] = ("NTFY_TOPIC", "wss://ntfy.sh/topic");
	assert!(load_bridge_config_with(&missing_path(), env(&pairs)).is_err());
}

#[test]
fn unparseable_url_is_rejected() {
	let mut pairs = REQUIRED.to_vec();
	pairs[2] = ("NTFY_TOPIC", "ntfy.sh/no-scheme");
	let err = load_bridge_config_with(&missing_path(), env(&pairs)).unwrap_err();
	assert!(format!("{err:#}").contains("NTFY_TOPIC"), "unexpected error: {err:#}");
}

#[test]
fn credentials_in_notify_url_are_accepted() {
	let mut pairs = REQUIRED.to_vec();
	pairs[2] = ("NTFY_TOPIC", "https://user:pw@ntfy.example/alerts");
	let cfg = load_bridge_config_with(&missing_path(), env(&pairs)).unwrap();
	assert_eq!(cfg.ntfy_url, "https://user:pw@ntfy.example/alerts");

	pairs[1] = ("WS_URL", "wss://[::1]:6001/app/key?protocol=7");
	assert!(load_bridge_config_with(&missing_path(), env(&pairs)).is_ok());
}

#[test]
fn chatroom_id_must_be_channel_safe() {
	let mut pairs = REQUIRED.to_vec();
	pairs[0] = ("CHATROOM_ID", "66 8");
	assert!(load_bridge_config_with(&missing_path(), env(&pairs)).is_err());
}

#[test]
fn file_values_are_used_and_env_wins() {
	let path = write_config(
		"merge",
		r#"
metrics_bind = "127.0.0.1:9100"

[kick]
chatroom_id = "1"
ws_url = "ws://127.0.0.1:6001/app/key"
reconnect_delay_ms = 750
ping_interval_secs = 30

[ntfy]
topic_url = "http://127.0.0.1:8080/alerts"
chunk_limit = 80
send_delay_ms = 2500
"#,
	);

	let cfg = load_bridge_config_with(&path, env(&[("CHATROOM_ID", "999"), ("KICKNTFY_SEND_DELAY_MS", "100")])).unwrap();

	assert_eq!(cfg.chatroom.as_str(), "999");
	assert_eq!(cfg.ws_url, "ws://127.0.0.1:6001/app/key");
	assert_eq!(cfg.ntfy_url, "http://127.0.0.1:8080/alerts");
	assert_eq!(cfg.chunk_limit, 80);
	assert_eq!(cfg.send_delay, Duration::from_millis(100));
	assert_eq!(cfg.reconnect_delay, Duration::from_millis(750));
	assert_eq!(cfg.ping_interval, Duration::from_secs(30));
	assert_eq!(cfg.ping_timeout, Duration::from_secs(20));
	assert_eq!(cfg.metrics_bind.as_deref(), Some("127.0.0.1:9100"));
}

#[test]
fn tuning_overrides_from_env() {
	let mut pairs = REQUIRED.to_vec();
	pairs.extend_from_slice(&[
		("KICKNTFY_CHUNK_LIMIT", "50"),
		("KICKNTFY_RECONNECT_DELAY_MS", "250"),
		("KICKNTFY_PING_INTERVAL_SECS", "15"),
		("KICKNTFY_PING_TIMEOUT_SECS", "7"),
		("KICKNTFY_HTTP_TIMEOUT_SECS", "3"),
		("KICKNTFY_METRICS_BIND", " 0.0.0.0:9000 "),
	]);
	let cfg = load_bridge_config_with(&missing_path(), env(&pairs)).unwrap();

	assert_eq!(cfg.chunk_limit, 50);
	assert_eq!(cfg.reconnect_delay, Duration::from_millis(250));
	assert_eq!(cfg.ping_interval, Duration::from_secs(15));
	assert_eq!(cfg.ping_timeout, Duration::from_secs(7));
	assert_eq!(cfg.http_timeout, Duration::from_secs(3));
	assert_eq!(cfg.metrics_bind.as_deref(), Some("0.0.0.0:9000"));
}

#[test]
fn bad_numeric_overrides_are_ignored() {
	let mut pairs = REQUIRED.to_vec();
	pairs.extend_from_slice(&[("KICKNTFY_CHUNK_LIMIT", "lots"), ("KICKNTFY_PING_INTERVAL_SECS", "0")]);
	let cfg = load_bridge_config_with(&missing_path(), env(&pairs)).unwrap();

	assert_eq!(cfg.chunk_limit, 123);
	assert_eq!(cfg.ping_interval, Duration::from_secs(20));
}

#[test]
fn malformed_toml_is_an_error() {
	let path = write_config("broken", "[kick\nchatroom_id = ");
	let err = load_bridge_config_with(&path, env(REQUIRED)).unwrap_err();
	assert!(format!("{err:#}").contains("parse TOML"), "unexpected error: {err:#}");
}

#[test]
fn default_path_lives_under_home() {
	if let Ok(path) = default_config_path() {
		assert!(path.ends_with(".kickntfy/config.toml"));
	}
}
