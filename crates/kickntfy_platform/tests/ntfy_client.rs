#![forbid(unsafe_code)]

use std::convert::Infallible;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use kickntfy_domain::NotificationJob;
use kickntfy_platform::{NotificationSink, NtfyClient};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Debug)]
struct CapturedRequest {
	method: Method,
	path: String,
	title: Option<String>,
	body: Bytes,
}

async fn capture(
	req: Request<Incoming>,
	status: StatusCode,
	seen: mpsc::UnboundedSender<CapturedRequest>,
) -> Result<Response<Full<Bytes>>, Infallible> {
	let (parts, body) = req.into_parts();
	let body = body.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
	let _ = seen.send(CapturedRequest {
		method: parts.method,
		path: parts.uri.path().to_string(),
		title: parts
			.headers
			.get("title")
			.and_then(|v| v.to_str().ok())
			.map(str::to_string),
		body,
	});

	let mut resp = Response::new(Full::new(Bytes::new()));
	*resp.status_mut() = status;
	Ok(resp)
}

/// Serves every request with `status` and forwards what was received.
async fn capture_server(status: StatusCode) -> (String, mpsc::UnboundedReceiver<CapturedRequest>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
	let addr = listener.local_addr().expect("local addr");
	let (tx, rx) = mpsc::unbounded_channel();

	tokio::spawn(async move {
		while let Ok((stream, _)) = listener.accept().await {
			let io = TokioIo::new(stream);
			let tx = tx.clone();
			tokio::spawn(async move {
				let service = service_fn(move |req| capture(req, status, tx.clone()));
				let _ = http1::Builder::new().serve_connection(io, service).await;
			});
		}
	});

	(format!("http://{addr}/kick-alerts"), rx)
}

async fn next_request(rx: &mut mpsc::UnboundedReceiver<CapturedRequest>) -> CapturedRequest {
	timeout(Duration::from_secs(5), rx.recv())
		.await
		.expect("request within timeout")
		.expect("server open")
}

#[tokio::test]
async fn publishes_text_body_with_title_header() {
	let (url, mut seen) = capture_server(StatusCode::OK).await;
	let client = NtfyClient::new(url, Duration::from_secs(5)).unwrap();

	let job = NotificationJob::new("alice", "hello there 👋");
	timeout(Duration::from_secs(10), client.deliver(&job))
		.await
		.expect("publish within timeout")
		.expect("publish ok");

	let req = next_request(&mut seen).await;
	assert_eq!(req.method, Method::POST);
	assert_eq!(req.path, "/kick-alerts");
	assert_eq!(req.title.as_deref(), Some("alice"));
	assert_eq!(req.body, "hello there 👋".as_bytes());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
	let (url, mut seen) = capture_server(StatusCode::INTERNAL_SERVER_ERROR).await;
	let client = NtfyClient::new(url, Duration::from_secs(5)).unwrap();

	let err = timeout(Duration::from_secs(10), client.publish("bob", "boom"))
		.await
		.expect("publish within timeout")
		.expect_err("500 should fail");
	assert!(err.to_string().contains("500"), "unexpected error: {err:#}");

	let req = next_request(&mut seen).await;
	assert_eq!(req.body, &b"boom"[..]);
}

#[tokio::test]
async fn unreachable_server_is_an_error() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let client = NtfyClient::new(format!("http://{addr}/topic"), Duration::from_secs(2)).unwrap();
	let result = timeout(Duration::from_secs(10), client.publish("bob", "hi"))
		.await
		.expect("publish within timeout");
	assert!(result.is_err());
}
