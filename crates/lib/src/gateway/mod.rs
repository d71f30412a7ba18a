//! Gateway: the skill server HTTP surface.
//!
//! Single port serves a health probe and the `POST /sayHello` skill endpoint.
//! Each request is independent; the only state shared across requests is the config.

mod protocol;
mod server;

pub use protocol::{CallbackWaitResponse, SkillPayload, SkillReply, SkillResponse, UserRequest};
pub use server::run_gateway;
