//! Gateway HTTP server: health probe and the `POST /sayHello` skill endpoint.

use crate::callback::{self, DeferredAnswer};
use crate::config::{self, Config};
use crate::gateway::protocol::{CallbackWaitResponse, SkillPayload, SkillReply, SkillResponse};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Shared state for the gateway. Config only — requests carry everything else.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (Ctrl+C or SIGTERM). Deferred replies still pending
/// at shutdown are dropped with the runtime.
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let state = GatewayState {
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/", get(health_http))
        .route("/sayHello", post(say_hello))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received; pending deferred replies are dropped");
}

/// POST /sayHello — parse the skill payload and answer synchronously.
///
/// Trigger utterance: return the acknowledgment and, when a callback URL is
/// present, schedule the deferred reply first (fire-and-forget; scheduling
/// never delays or fails the acknowledgment). Anything else: return the fixed
/// confirmation. The synchronous path does no network I/O and never sleeps.
async fn say_hello(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SkillReply>, StatusCode> {
    // Read and logged only; the platform's Authorization header is not enforced.
    let auth = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    log::debug!("sayHello Authorization header: {:?}", auth);

    let payload: SkillPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("sayHello payload rejected: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let replies = &state.config.replies;
    let callback_url = payload.user_request.callback_url.as_deref().unwrap_or("");

    if payload.user_request.utterance == replies.trigger {
        if callback_url.is_empty() {
            log::info!("trigger matched but no callback URL; acknowledgment only");
        } else {
            // Detached task; the handle is dropped so the delivery outlives this request.
            let _ = callback::spawn_deferred(
                callback_url.to_string(),
                DeferredAnswer::new(replies.deferred_text.clone()),
                Duration::from_secs(replies.delay_seconds),
            );
        }
        let ack = CallbackWaitResponse::new(config::render_ack_text(replies));
        return Ok(Json(SkillReply::Wait(ack)));
    }

    Ok(Json(SkillReply::Answer(SkillResponse::simple_text(
        replies.confirm_text.clone(),
    ))))
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}
