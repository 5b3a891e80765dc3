//! Runtime layer for lmbridge.
//!
//! Owns the bridge lifecycle ([`BridgeSupervisor`]), the in-memory event
//! trail ([`MemoryLogSink`]) and the concrete upstream providers. The HTTP
//! surface itself lives in `lmbridge-proxy`.

#![deny(unsafe_code)]

pub mod bridge;
pub mod credentials;
pub mod logs;
pub mod providers;

pub use bridge::{BridgeStatus, BridgeSupervisor, SupervisorError, run_bridge_standalone};
pub use credentials::{Credential, CredentialSource, discover_credential};
pub use logs::{MAX_LOG_LINES, MemoryLogSink};
pub use providers::{OpenAiCompatProvider, StaticProvider};
