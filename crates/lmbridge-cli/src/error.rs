//! CLI-specific error types and exit codes.

use lmbridge_core::{SettingsError, UpstreamError};
use lmbridge_runtime::SupervisorError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid option values.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The upstream provider failed or could not be reached.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The bridge could not be started or stopped.
    #[error("Bridge error: {0}")]
    Bridge(String),

    /// `check` found the bridge not ready to serve.
    #[error("Not ready: {0}")]
    NotReady(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// - 1: not ready / general failure
    /// - 69: upstream unavailable (EX_UNAVAILABLE)
    /// - 78: configuration error (EX_CONFIG)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotReady(_) | Self::Bridge(_) => 1,
            Self::Upstream(_) => 69,
            Self::Config(_) => 78,
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<UpstreamError> for CliError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::InvalidSettings(e) => e.into(),
            SupervisorError::UpstreamUnavailable(msg) => Self::Upstream(msg),
            other => Self::Bridge(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::NotReady("x".into()).exit_code(), 1);
        assert_eq!(CliError::Config("x".into()).exit_code(), 78);
        assert_eq!(CliError::Upstream("x".into()).exit_code(), 69);
    }

    #[test]
    fn test_supervisor_errors_keep_their_category() {
        let err: CliError = SupervisorError::InvalidSettings(SettingsError::InvalidPort(80)).into();
        assert!(matches!(err, CliError::Config(_)));

        let err: CliError = SupervisorError::PortInUse { port: 11435 }.into();
        assert!(matches!(err, CliError::Bridge(msg) if msg.contains("11435")));
    }
}
