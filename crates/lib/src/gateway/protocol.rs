//! Kakao skill wire shapes (inbound payload and the two outbound response bodies).

use serde::{Deserialize, Serialize};

/// Protocol version tag required on every outbound body.
pub const SKILL_VERSION: &str = "2.0";

/// Inbound skill payload: `{ "userRequest": { "utterance", "callbackUrl"? } }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillPayload {
    pub user_request: UserRequest,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub utterance: String,
    /// Present only when the platform allows a deferred reply for this request.
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Acknowledgment body: `{ "version": "2.0", "useCallback": true, "data": { "text" } }`.
/// Returned synchronously on the deferred path; tells the platform a callback follows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackWaitResponse {
    pub version: String,
    pub use_callback: bool,
    pub data: WaitData,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaitData {
    pub text: String,
}

impl CallbackWaitResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            version: SKILL_VERSION.to_string(),
            use_callback: true,
            data: WaitData { text: text.into() },
        }
    }
}

/// Answer body: `{ "version": "2.0", "template": { "outputs": [ { "simpleText": { "text" } } ] } }`.
/// Used both for the immediate path and for callback delivery.
#[derive(Debug, Clone, Serialize)]
pub struct SkillResponse {
    pub version: String,
    pub template: Template,
}

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub simple_text: SimpleText,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimpleText {
    pub text: String,
}

impl SkillResponse {
    /// Single simpleText output with the given text.
    pub fn simple_text(text: impl Into<String>) -> Self {
        Self {
            version: SKILL_VERSION.to_string(),
            template: Template {
                outputs: vec![Output {
                    simple_text: SimpleText { text: text.into() },
                }],
            },
        }
    }
}

/// Handler reply: one of the two outbound shapes, serialized as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SkillReply {
    Wait(CallbackWaitResponse),
    Answer(SkillResponse),
}
