//! OpenAI-compatible HTTP bridge server.
//!
//! Exposes `/health`, `/v1/models` and `/v1/chat/completions` on a
//! pre-bound loopback listener and translates chat completions into calls
//! on a [`lmbridge_core::ChatModelProvider`].

#![deny(unsafe_code)]

mod body;
pub mod completion;
pub mod error;
pub mod models;
pub mod server;

pub use error::ApiError;
pub use server::{router, serve};
