#![forbid(unsafe_code)]

use std::fmt;
use std::time::Duration;

use anyhow::anyhow;
use futures_util::{SinkExt, StreamExt};
use kickntfy_domain::ChatroomId;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, sleep_until, timeout};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::pusher::{self, ConnectionEstablished, PusherEnvelope, PusherError};
use super::router::EventRouter;
use crate::new_session_id;
use crate::pipeline::NotificationTx;

pub(crate) type KickWs = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(20);
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct StreamSessionConfig {
	/// Pusher websocket URL.
	pub ws_url: String,
	pub chatroom: ChatroomId,
	/// Fixed wait between a session ending and the next connect.
	pub reconnect_delay: Duration,
	/// How often a websocket ping is sent.
	pub ping_interval: Duration,
	/// How long to wait for any inbound frame after a ping.
	pub ping_timeout: Duration,
}

impl StreamSessionConfig {
	pub fn new(ws_url: impl Into<String>, chatroom: ChatroomId) -> Self {
		Self {
			ws_url: ws_url.into(),
			chatroom,
			reconnect_delay: DEFAULT_RECONNECT_DELAY,
			ping_interval: DEFAULT_PING_INTERVAL,
			ping_timeout: DEFAULT_PING_TIMEOUT,
		}
	}
}

/// Why one connection attempt ended.
#[derive(Debug)]
pub enum SessionEnd {
	ConnectFailed(anyhow::Error),
	/// The server closed the stream.
	Closed,
	KeepaliveTimeout,
	Error(anyhow::Error),
	/// The notification queue has no consumer anymore.
	Shutdown,
}

impl SessionEnd {
	pub fn is_shutdown(&self) -> bool {
		matches!(self, SessionEnd::Shutdown)
	}
}

impl fmt::Display for SessionEnd {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ConnectFailed(err) => write!(f, "connect failed: {err:#}"),
			Self::Closed => f.write_str("stream closed"),
			Self::KeepaliveTimeout => f.write_str("keepalive timeout"),
			Self::Error(err) => write!(f, "stream error: {err:#}"),
			Self::Shutdown => f.write_str("shutdown"),
		}
	}
}

/// Reads one Kick chatroom and feeds its events into the notification queue,
/// reconnecting forever.
pub struct StreamSession {
	cfg: StreamSessionConfig,
	router: EventRouter,
	jobs: NotificationTx,
}

impl StreamSession {
	pub fn new(cfg: StreamSessionConfig, router: EventRouter, jobs: NotificationTx) -> Self {
		Self { cfg, router, jobs }
	}

	/// Connect, stream, back off, repeat. Returns only once the queue consumer is gone.
	pub async fn run(mut self) {
		let mut attempt: u64 = 0;
		loop {
			let end = self.run_once().await;
			if end.is_shutdown() {
				info!("notification queue closed; stopping kick stream session");
				return;
			}

			attempt = attempt.saturating_add(1);
			metrics::counter!("kickntfy_stream_reconnects_total").increment(1);
			info!(
				reason = %end,
				attempt,
				delay = ?self.cfg.reconnect_delay,
				"❌ kick chat connection lost; retrying"
			);
			sleep(self.cfg.reconnect_delay).await;
		}
	}

	/// A single connection attempt, from connect to teardown.
	pub async fn run_once(&mut self) -> SessionEnd {
		let session_id = new_session_id();
		info!(url = %self.cfg.ws_url, %session_id, "connecting to kick chat websocket");

		let mut ws: KickWs = match tokio_tungstenite::connect_async(self.cfg.ws_url.as_str()).await {
			Ok((ws, _resp)) => ws,
			Err(err) => return SessionEnd::ConnectFailed(anyhow!(err).context("connect_async to kick pusher ws")),
		};
		metrics::counter!("kickntfy_stream_connects_total").increment(1);
		info!(%session_id, "✅ connected to kick chat websocket");

		if let Err(end) = self.handshake(&mut ws, &session_id).await {
			let _ = ws.close(None).await;
			return end;
		}

		let end = self.stream(&mut ws, &session_id).await;
		let _ = ws.close(None).await;
		end
	}

	async fn handshake(&mut self, ws: &mut KickWs, session_id: &str) -> Result<(), SessionEnd> {
		let wait = self.cfg.ping_interval + self.cfg.ping_timeout;
		let first = loop {
			let msg = match timeout(wait, ws.next()).await {
				Ok(Some(Ok(msg))) => msg,
				Ok(Some(Err(err))) => return Err(SessionEnd::Error(anyhow!(err).context("read first frame"))),
				Ok(None) => return Err(SessionEnd::Closed),
				Err(_) => return Err(SessionEnd::KeepaliveTimeout),
			};
			match msg {
				Message::Text(text) => break text,
				Message::Close(frame) => {
					debug!(?frame, %session_id, "kick ws closed during handshake");
					return Err(SessionEnd::Closed);
				}
				Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {}
			}
		};

		match PusherEnvelope::parse(first.as_str()) {
			Ok(envelope) if envelope.event == pusher::CONNECTION_ESTABLISHED => {
				if let Ok(est) = envelope.payload::<ConnectionEstablished>() {
					debug!(
						%session_id,
						socket_id = est.socket_id.as_deref().unwrap_or(""),
						activity_timeout = est.activity_timeout.unwrap_or(0),
						"pusher connection established"
					);
				}
				let frame = pusher::subscribe_frame(&self.cfg.chatroom);
				ws.send(Message::Text(frame.into()))
					.await
					.map_err(|err| SessionEnd::Error(anyhow!(err).context("send pusher:subscribe")))?;
				info!(chatroom = %self.cfg.chatroom, %session_id, "📡 subscribed to chatroom");
			}
			Ok(envelope) => {
				warn!(event = %envelope.event, %session_id, "unexpected first frame; streaming without subscribe");
			}
			Err(err) => {
				warn!(error = %err, %session_id, "undecodable first frame; streaming without subscribe");
			}
		}

		Ok(())
	}

	async fn stream(&mut self, ws: &mut KickWs, session_id: &str) -> SessionEnd {
		let ping_interval = self.cfg.ping_interval;
		let ping_timeout = self.cfg.ping_timeout;

		let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
		ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
		let mut pong_deadline: Option<Instant> = None;

		loop {
			let keepalive_at = pong_deadline.unwrap_or_else(|| Instant::now() + ping_interval + ping_timeout);

			tokio::select! {
				msg = ws.next() => {
					let Some(msg) = msg else {
						return SessionEnd::Closed;
					};
					pong_deadline = None;

					match msg {
						Ok(Message::Text(text)) => {
							if let Some(end) = self.handle_text(ws, text.as_str(), session_id).await {
								return end;
							}
						}
						// tungstenite queues the Pong reply itself.
						Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
						Ok(Message::Close(frame)) => {
							info!(?frame, %session_id, "kick ws closed by server");
							return SessionEnd::Closed;
						}
						Ok(Message::Binary(_)) | Ok(Message::Frame(_)) => {}
						Err(err) => return SessionEnd::Error(anyhow!(err).context("kick ws read")),
					}
				}

				_ = ping.tick() => {
					if pong_deadline.is_none() {
						pong_deadline = Some(Instant::now() + ping_timeout);
					}
					if let Err(err) = ws.send(Message::Ping(Default::default())).await {
						return SessionEnd::Error(anyhow!(err).context("kick ws ping"));
					}
				}

				_ = sleep_until(keepalive_at), if pong_deadline.is_some() => {
					return SessionEnd::KeepaliveTimeout;
				}
			}
		}
	}

	async fn handle_text(&mut self, ws: &mut KickWs, text: &str, session_id: &str) -> Option<SessionEnd> {
		let envelope = match PusherEnvelope::parse(text) {
			Ok(envelope) => envelope,
			Err(err) => {
				metrics::counter!("kickntfy_frames_skipped_total").increment(1);
				debug!(error = %err, %session_id, "skipping undecodable frame");
				return None;
			}
		};

		if envelope.is_control() {
			return self.handle_control(ws, &envelope, session_id).await;
		}

		match self.router.route_envelope(&envelope) {
			Ok(jobs) => {
				for job in jobs {
					if self.jobs.push(job).is_err() {
						return Some(SessionEnd::Shutdown);
					}
				}
			}
			Err(err) => {
				metrics::counter!("kickntfy_frames_skipped_total").increment(1);
				debug!(error = %err, %session_id, "skipping malformed event");
			}
		}
		None
	}

	async fn handle_control(
		&mut self,
		ws: &mut KickWs,
		envelope: &PusherEnvelope,
		session_id: &str,
	) -> Option<SessionEnd> {
		match envelope.event.as_str() {
			pusher::PING => {
				if let Err(err) = ws.send(Message::Text(pusher::pong_frame().into())).await {
					return Some(SessionEnd::Error(anyhow!(err).context("send pusher:pong")));
				}
			}
			pusher::ERROR => {
				let detail = envelope.payload::<PusherError>().ok();
				warn!(
					code = detail.as_ref().and_then(|d| d.code).unwrap_or(0),
					message = detail.as_ref().and_then(|d| d.message.as_deref()).unwrap_or(""),
					%session_id,
					"pusher error"
				);
			}
			pusher::SUBSCRIPTION_SUCCEEDED => {
				info!(channel = envelope.channel.as_deref().unwrap_or(""), %session_id, "pusher subscription confirmed");
			}
			other => {
				debug!(event = %other, %session_id, "ignoring pusher control frame");
			}
		}
		None
	}
}
