//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the bridge expects from infrastructure.
//! They contain no implementation details and use only domain types.

pub mod chat_provider;
pub mod log_sink;

pub use chat_provider::{ChatModelProvider, FragmentStream, UpstreamError};
pub use log_sink::{BridgeLogSink, NoopLogSink, format_log_line};
