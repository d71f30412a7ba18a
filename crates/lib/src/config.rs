//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.kkobot/config.json`). A missing
//! file means defaults; the defaults reproduce the stock trigger and reply set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Trigger and reply texts for the skill endpoint.
    #[serde(default)]
    pub replies: RepliesConfig,
}

/// Gateway bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// HTTP port (default 15151).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0" — the platform must be able to reach the webhook).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    15151
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Trigger utterance and reply texts.
///
/// `ack_text` is a template: the literal `{delay}` is replaced with
/// `delay_seconds` when rendered, so the wording shown to the user and the
/// actual wait before callback delivery cannot drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliesConfig {
    /// Utterance that takes the deferred path.
    #[serde(default = "default_trigger")]
    pub trigger: String,

    /// Acknowledgment text returned synchronously on the deferred path.
    #[serde(default = "default_ack_text")]
    pub ack_text: String,

    /// The real answer, delivered to the callback URL after the delay.
    #[serde(default = "default_deferred_text")]
    pub deferred_text: String,

    /// Immediate confirmation for any non-trigger utterance.
    #[serde(default = "default_confirm_text")]
    pub confirm_text: String,

    /// Seconds to wait before delivering the deferred answer.
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,
}

fn default_trigger() -> String {
    "ㅎㅇ".to_string()
}

fn default_ack_text() -> String {
    "생각하고 있는 중이에요😘 \n{delay}초 정도 소요될 거 같아요 기다려 주실래요?!".to_string()
}

fn default_deferred_text() -> String {
    "그건 너무 어려워요 ㅠ_ㅠㅠ".to_string()
}

fn default_confirm_text() -> String {
    "내용을 전송하였습니다.".to_string()
}

fn default_delay_seconds() -> u64 {
    7
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            ack_text: default_ack_text(),
            deferred_text: default_deferred_text(),
            confirm_text: default_confirm_text(),
            delay_seconds: default_delay_seconds(),
        }
    }
}

/// Render the acknowledgment text, substituting `{delay}` with the configured delay.
pub fn render_ack_text(replies: &RepliesConfig) -> String {
    replies
        .ack_text
        .replace("{delay}", &replies.delay_seconds.to_string())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("KKOBOT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".kkobot").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or KKOBOT_CONFIG_PATH / the default). Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(default_config_path);
    if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        return Ok(Config::default());
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing config from {}", path.display()))
}
