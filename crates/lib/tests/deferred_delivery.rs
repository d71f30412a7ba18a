//! Integration tests for deferred callback delivery: a local capture server
//! stands in for the platform's callback endpoint, and the tests assert
//! exactly-once delivery after the configured delay, independence of repeated
//! requests, failure reporting, and the placeholder fallback.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use lib::callback::{send_callback, spawn_deferred, DeferredAnswer, DeliveryError};
use lib::config::Config;
use lib::gateway;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
struct Capture {
    bodies: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl Capture {
    fn count(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }

    fn first_text(&self) -> Option<String> {
        self.bodies
            .lock()
            .unwrap()
            .first()
            .and_then(|b| b.pointer("/template/outputs/0/simpleText/text"))
            .and_then(|v| v.as_str())
            .map(String::from)
    }
}

async fn capture_ok(State(capture): State<Capture>, Json(body): Json<serde_json::Value>) -> StatusCode {
    capture.bodies.lock().unwrap().push(body);
    StatusCode::OK
}

async fn always_500(Json(_body): Json<serde_json::Value>) -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Start a callback endpoint on a free loopback port. Returns its URL and the capture.
async fn start_capture_server() -> (String, Capture) {
    let capture = Capture::default();
    let app = Router::new()
        .route("/cb", post(capture_ok))
        .with_state(capture.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind capture server");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}/cb", addr), capture)
}

async fn start_500_server() -> String {
    let app = Router::new().route("/cb", post(always_500));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind 500 server");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}/cb", addr)
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

async fn start_gateway(mut config: Config) -> String {
    let port = free_port();
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();
    tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(&base).send().await {
            if resp.status().is_success() {
                return base;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("gateway did not become healthy at {} within 5s", base);
}

async fn wait_for_captures(capture: &Capture, expected: usize, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if capture.count() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!(
        "expected {} callback deliveries within {:?}, got {}",
        expected,
        timeout,
        capture.count()
    );
}

#[tokio::test]
async fn trigger_with_callback_url_delivers_once_after_delay() {
    let (cb_url, capture) = start_capture_server().await;
    let mut config = Config::default();
    config.replies.delay_seconds = 1;
    let base = start_gateway(config).await;

    let started = Instant::now();
    let client = reqwest::Client::new();
    let ack: serde_json::Value = client
        .post(format!("{}/sayHello", base))
        .json(&json!({"userRequest": {"utterance": "ㅎㅇ", "callbackUrl": cb_url}}))
        .send()
        .await
        .expect("POST /sayHello")
        .json()
        .await
        .expect("parse ack");
    assert_eq!(ack.get("useCallback").and_then(|v| v.as_bool()), Some(true));
    // The acknowledgment returns immediately, long before the delay elapses.
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(capture.count(), 0);

    wait_for_captures(&capture, 1, Duration::from_secs(5)).await;
    assert!(
        started.elapsed() >= Duration::from_secs(1),
        "delivery arrived before the configured delay"
    );
    assert_eq!(capture.first_text().as_deref(), Some("그건 너무 어려워요 ㅠ_ㅠㅠ"));

    // Exactly once: no further deliveries show up.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(capture.count(), 1);
}

#[tokio::test]
async fn empty_callback_url_and_non_trigger_schedule_nothing() {
    let (cb_url, capture) = start_capture_server().await;
    let mut config = Config::default();
    config.replies.delay_seconds = 0;
    let base = start_gateway(config).await;
    let client = reqwest::Client::new();

    // Trigger with empty callback URL: acknowledgment only.
    client
        .post(format!("{}/sayHello", base))
        .json(&json!({"userRequest": {"utterance": "ㅎㅇ", "callbackUrl": ""}}))
        .send()
        .await
        .expect("POST /sayHello");

    // Non-trigger utterance with a perfectly good callback URL: immediate path only.
    client
        .post(format!("{}/sayHello", base))
        .json(&json!({"userRequest": {"utterance": "hello", "callbackUrl": cb_url}}))
        .send()
        .await
        .expect("POST /sayHello");

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(capture.count(), 0);
}

#[tokio::test]
async fn repeated_requests_deliver_independently() {
    let (cb_url, capture) = start_capture_server().await;
    let mut config = Config::default();
    config.replies.delay_seconds = 0;
    let base = start_gateway(config).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let resp = client
            .post(format!("{}/sayHello", base))
            .json(&json!({"userRequest": {"utterance": "ㅎㅇ", "callbackUrl": cb_url}}))
            .send()
            .await
            .expect("POST /sayHello");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
    }

    wait_for_captures(&capture, 2, Duration::from_secs(5)).await;
    assert_eq!(capture.count(), 2);
}

#[tokio::test]
async fn spawn_deferred_waits_then_sends() {
    let (cb_url, capture) = start_capture_server().await;
    let started = Instant::now();
    let handle = spawn_deferred(
        cb_url,
        DeferredAnswer::new("answer"),
        Duration::from_millis(300),
    );
    handle.await.expect("deferred task completes");
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(capture.count(), 1);
    assert_eq!(capture.first_text().as_deref(), Some("answer"));
}

#[tokio::test]
async fn deferred_task_survives_delivery_failure() {
    // Unreachable URL: the task must finish cleanly (error logged, not propagated).
    let port = free_port();
    let handle = spawn_deferred(
        format!("http://127.0.0.1:{}/cb", port),
        DeferredAnswer::new("answer"),
        Duration::from_millis(0),
    );
    handle.await.expect("deferred task completes despite failure");
}

#[tokio::test]
async fn sender_reports_http_failure_without_panicking() {
    let url = start_500_server().await;
    let err = send_callback(&url, &DeferredAnswer::new("answer"))
        .await
        .expect_err("500 must be reported as a failure");
    match err {
        DeliveryError::Status { status, .. } => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        }
        other => panic!("expected status error, got: {}", other),
    }
}

#[tokio::test]
async fn sender_reports_transport_failure_without_panicking() {
    // Freshly allocated port with nothing listening: connection refused.
    let port = free_port();
    let err = send_callback(
        &format!("http://127.0.0.1:{}/cb", port),
        &DeferredAnswer::new("answer"),
    )
    .await
    .expect_err("unreachable host must be reported as a failure");
    assert!(matches!(err, DeliveryError::Transport(_)));

    // Malformed URL goes the same way.
    let err = send_callback("not a url", &DeferredAnswer::new("answer"))
        .await
        .expect_err("malformed URL must be reported as a failure");
    assert!(matches!(err, DeliveryError::Transport(_)));
}

#[tokio::test]
async fn missing_answer_text_falls_back_to_placeholder() {
    let (cb_url, capture) = start_capture_server().await;
    send_callback(&cb_url, &DeferredAnswer::default())
        .await
        .expect("delivery succeeds");
    assert_eq!(capture.first_text().as_deref(), Some("응답이 준비되었습니다."));
}
