//! Domain types for the bridge.
//!
//! These are pure types with no infrastructure dependencies. The proxy
//! layer maps them to and from the OpenAI wire format.

mod chat;
mod model;
mod usage;

pub use chat::{ChatMessage, ChatRole, UpstreamMessage, UpstreamRole, translate_messages};
pub use model::{ModelDescriptor, select_model};
pub use usage::{TokenUsage, estimate_tokens};
