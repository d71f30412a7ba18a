//! Deferred callback delivery: wait, then POST the final answer to the
//! platform-issued callback URL.
//!
//! The task is fire-and-forget. Nothing cancels it once scheduled, and a
//! delivery still pending when the process exits is lost — there is no
//! at-least-once guarantee and no retry.

use crate::gateway::SkillResponse;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Text sent when the deferred answer carries no text of its own.
pub const PLACEHOLDER_TEXT: &str = "응답이 준비되었습니다.";

/// The answer delivered out-of-band after the delay.
#[derive(Debug, Clone, Default)]
pub struct DeferredAnswer {
    pub text: Option<String>,
}

impl DeferredAnswer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Callback delivery failure: the platform rejected the POST, or it never arrived.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("callback POST returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("callback transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Spawn the deferred delivery task: sleep for `delay`, then send the answer
/// to `callback_url` exactly once.
///
/// The task is detached; callers drop the handle (tests may await it). Any
/// delivery error is logged and swallowed — the original request has already
/// been answered by the time this runs, so there is nobody left to tell.
pub fn spawn_deferred(
    callback_url: String,
    answer: DeferredAnswer,
    delay: Duration,
) -> JoinHandle<()> {
    log::info!(
        "deferred reply scheduled in {}s for {}",
        delay.as_secs(),
        callback_url
    );
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match send_callback(&callback_url, &answer).await {
            Ok(()) => log::info!("deferred reply delivered to {}", callback_url),
            Err(e) => log::warn!("deferred reply to {} failed: {}", callback_url, e),
        }
    })
}

/// POST the callback body to `url` with a client built for this call.
///
/// The body is the simpleText answer shape; a missing answer text falls back
/// to [`PLACEHOLDER_TEXT`]. Only HTTP 200 counts as accepted. No retry — a
/// failed delivery is permanently lost.
pub async fn send_callback(url: &str, answer: &DeferredAnswer) -> Result<(), DeliveryError> {
    let text = answer.text.as_deref().unwrap_or(PLACEHOLDER_TEXT);
    let body = SkillResponse::simple_text(text);
    log::debug!(
        "sending callback to {}: {}",
        url,
        serde_json::to_string(&body).unwrap_or_default()
    );
    let client = reqwest::Client::new();
    let res = client.post(url).json(&body).send().await?;
    let status = res.status();
    let response_text = res.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::OK {
        log::info!("callback accepted by {}: {}", url, response_text);
        Ok(())
    } else {
        Err(DeliveryError::Status {
            status,
            body: response_text,
        })
    }
}
