//! Core domain types and port definitions for lmbridge.
//!
//! This crate has no HTTP or process dependencies. It defines the
//! protocol-neutral chat types, the upstream provider port, the event log
//! sink port and the bridge settings. Adapters live in `lmbridge-proxy`
//! (HTTP surface) and `lmbridge-runtime` (lifecycle and providers).

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    ChatMessage, ChatRole, ModelDescriptor, TokenUsage, UpstreamMessage, UpstreamRole,
    estimate_tokens, select_model, translate_messages,
};
pub use ports::{
    BridgeLogSink, ChatModelProvider, FragmentStream, NoopLogSink, UpstreamError,
    format_log_line,
};
pub use settings::{
    BridgeSettings, DEFAULT_BRIDGE_PORT, DEFAULT_PREFERRED_MODEL, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_UPSTREAM_URL, MAX_REQUEST_BODY_BYTES, SettingsError, validate_settings,
};
