//! Bridge lifecycle.
//!
//! - **BridgeSupervisor**: owns the listener, provides start/stop/status
//! - **lmbridge-proxy**: HTTP server with the OpenAI-compatible endpoints
//! - Hosts call supervisor methods without storing handles

pub mod supervisor;

pub use supervisor::{BridgeStatus, BridgeSupervisor, SupervisorError};

use std::sync::Arc;

use anyhow::Result;
use lmbridge_core::{BridgeLogSink, BridgeSettings, ChatModelProvider};
use tracing::info;

/// Run the bridge in the foreground until Ctrl-C (CLI usage).
///
/// Supervisor failures are returned as [`SupervisorError`] inside the
/// `anyhow::Error`, so callers can downcast them.
///
/// # Arguments
///
/// * `settings` - Bridge settings, validated on start
/// * `provider` - Upstream chat-model provider
/// * `log` - Event trail sink
pub async fn run_bridge_standalone(
    settings: BridgeSettings,
    provider: Arc<dyn ChatModelProvider>,
    log: Arc<dyn BridgeLogSink>,
) -> Result<()> {
    let supervisor = BridgeSupervisor::new(log);

    let addr = supervisor.start(settings, provider).await?;
    info!("Bridge started on {addr}");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    supervisor.stop().await?;
    Ok(())
}
