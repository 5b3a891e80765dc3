//! Bridge settings and validation.
//!
//! Settings are read once when the bridge starts and never re-read while
//! requests are in flight.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default port for the bridge listener.
pub const DEFAULT_BRIDGE_PORT: u16 = 11435;

/// Default preferred-model substring.
pub const DEFAULT_PREFERRED_MODEL: &str = "gpt-4o";

/// Default upstream request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Default OpenAI-compatible upstream (GitHub Models).
pub const DEFAULT_UPSTREAM_URL: &str = "https://models.inference.ai.azure.com";

/// Hard cap on inbound request bodies (10 MiB).
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 3_600_000;

/// Bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeSettings {
    /// Loopback port to listen on (0 picks an ephemeral port).
    pub port: u16,
    /// Start the bridge on activation without an explicit start.
    pub auto_start: bool,
    /// Substring used to pick a model when the request does not match one.
    pub preferred_model: String,
    /// Upper bound for a single upstream dispatch.
    pub request_timeout_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_BRIDGE_PORT,
            auto_start: true,
            preferred_model: DEFAULT_PREFERRED_MODEL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl BridgeSettings {
    /// Upstream timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Shorthand for [`validate_settings`].
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_settings(self)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Port should be >= 1024 (privileged ports require root), got {0}")]
    InvalidPort(u16),

    #[error("Request timeout must be between 1000 and 3600000 ms, got {0}")]
    InvalidTimeout(u64),
}

/// Validate settings values.
pub fn validate_settings(settings: &BridgeSettings) -> Result<(), SettingsError> {
    // Port 0 asks the OS for an ephemeral port
    if settings.port != 0 && settings.port < 1024 {
        return Err(SettingsError::InvalidPort(settings.port));
    }

    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&settings.request_timeout_ms) {
        return Err(SettingsError::InvalidTimeout(settings.request_timeout_ms));
    }

    Ok(())
}
