//! Bridge and upstream options, each also readable from the environment.
//!
//! A `.env` file in the working directory is loaded before parsing, so the
//! `LMBRIDGE_*` variables can live there.

use std::sync::Arc;

use clap::{ArgAction, Args};
use lmbridge_core::{
    BridgeSettings, ChatModelProvider, DEFAULT_BRIDGE_PORT, DEFAULT_PREFERRED_MODEL,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_UPSTREAM_URL,
};
use lmbridge_runtime::{Credential, OpenAiCompatProvider, StaticProvider};

use crate::error::CliError;

/// Listener and request options.
#[derive(Debug, Clone, Args)]
pub struct BridgeArgs {
    /// Loopback port to listen on
    #[arg(long, env = "LMBRIDGE_PORT", default_value_t = DEFAULT_BRIDGE_PORT, global = true)]
    pub port: u16,

    /// Model id substring used when the request names no available model
    #[arg(
        long,
        env = "LMBRIDGE_PREFERRED_MODEL",
        default_value = DEFAULT_PREFERRED_MODEL,
        global = true
    )]
    pub preferred_model: String,

    /// Upstream request timeout in milliseconds
    #[arg(
        long,
        env = "LMBRIDGE_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        global = true
    )]
    pub timeout_ms: u64,

    /// Start the bridge when run without a subcommand
    #[arg(
        long,
        env = "LMBRIDGE_AUTO_START",
        default_value_t = true,
        action = ArgAction::Set,
        global = true
    )]
    pub auto_start: bool,

    #[command(flatten)]
    pub upstream: UpstreamArgs,
}

impl BridgeArgs {
    /// Settings snapshot handed to the bridge at start.
    pub fn settings(&self) -> BridgeSettings {
        BridgeSettings {
            port: self.port,
            auto_start: self.auto_start,
            preferred_model: self.preferred_model.clone(),
            request_timeout_ms: self.timeout_ms,
        }
    }
}

/// Which upstream provider to talk to.
#[derive(Debug, Clone, Args)]
pub struct UpstreamArgs {
    /// Base URL of the OpenAI-compatible upstream
    #[arg(
        long,
        env = "LMBRIDGE_UPSTREAM_URL",
        default_value = DEFAULT_UPSTREAM_URL,
        global = true
    )]
    pub upstream_url: String,

    /// Fixed model catalog instead of upstream discovery (repeatable)
    #[arg(
        long = "model",
        env = "LMBRIDGE_MODELS",
        value_delimiter = ',',
        global = true
    )]
    pub models: Vec<String>,

    /// Use the built-in offline provider (no network)
    #[arg(long, env = "LMBRIDGE_OFFLINE", global = true)]
    pub offline: bool,
}

impl UpstreamArgs {
    /// Build the provider these options describe.
    pub fn provider(
        &self,
        credential: Option<&Credential>,
    ) -> Result<Arc<dyn ChatModelProvider>, CliError> {
        if self.offline {
            return Ok(Arc::new(StaticProvider::offline()));
        }

        let token = credential.map(|c| c.token.clone());
        let provider = OpenAiCompatProvider::new(&self.upstream_url, token)?
            .with_static_models(self.models.iter().cloned());
        Ok(Arc::new(provider))
    }
}
