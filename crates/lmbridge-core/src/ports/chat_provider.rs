//! Upstream chat-model provider port.
//!
//! This port abstracts the capability that actually generates text: model
//! discovery plus a single-shot send that yields a lazy stream of text
//! fragments. The bridge never retries and never falls back to a different
//! model once a send has been issued.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::{ModelDescriptor, UpstreamMessage};

/// Lazy sequence of response text fragments, in arrival order.
pub type FragmentStream = BoxStream<'static, Result<String, UpstreamError>>;

/// Faults signalled by an upstream provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The selected model is not known to the provider.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The provider refused access (not signed in, no consent, no entitlement).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The request's cancellation token fired.
    #[error("Request was cancelled")]
    Cancelled,

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0} ms")]
    TimedOut(u64),

    /// The provider could not be reached.
    #[error("Upstream transport error: {0}")]
    Transport(String),

    /// The provider answered with something that could not be decoded.
    #[error("Malformed upstream response: {0}")]
    Protocol(String),

    /// Any other provider fault.
    #[error("{0}")]
    Other(String),
}

impl UpstreamError {
    /// Returns a suggested HTTP status code for this error.
    #[must_use]
    pub const fn suggested_status_code(&self) -> u16 {
        match self {
            Self::ModelNotFound(_) => 404,
            Self::PermissionDenied(_) => 403,
            Self::Cancelled
            | Self::TimedOut(_)
            | Self::Transport(_)
            | Self::Protocol(_)
            | Self::Other(_) => 500,
        }
    }
}

/// Port for the upstream chat-model capability.
#[async_trait]
pub trait ChatModelProvider: Send + Sync + fmt::Debug {
    /// Short provider label, reported by the health endpoint.
    fn name(&self) -> &str;

    /// List the chat models currently available.
    ///
    /// Called on every request; implementations must not cache results
    /// across calls.
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, UpstreamError>;

    /// Send a conversation to `model` and return its response fragments.
    ///
    /// Implementations should stop producing fragments promptly once
    /// `cancel` fires.
    async fn send_request(
        &self,
        model: &ModelDescriptor,
        messages: Vec<UpstreamMessage>,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, UpstreamError>;
}
