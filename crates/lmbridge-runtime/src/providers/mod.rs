//! Concrete upstream chat-model providers.

mod openai_compat;
mod sse;
mod static_provider;

pub use openai_compat::OpenAiCompatProvider;
pub use static_provider::StaticProvider;
