//! Serve command handler.
//!
//! Runs the bridge in the foreground until Ctrl-C. Also used for bare
//! activation when auto-start is enabled.

use std::sync::Arc;

use lmbridge_runtime::{MemoryLogSink, SupervisorError, run_bridge_standalone};
use tracing::{info, warn};

use super::credential_for;
use crate::config::BridgeArgs;
use crate::error::CliError;

/// Execute the serve command.
pub async fn execute(args: &BridgeArgs) -> Result<(), CliError> {
    let settings = args.settings();
    settings.validate()?;

    let credential = credential_for(&args.upstream).await;
    match &credential {
        Some(c) => info!(source = %c.source, "Using upstream credential"),
        None if !args.upstream.offline => {
            warn!("No upstream credential found; set GITHUB_TOKEN or run `gh auth login`");
        }
        None => info!("Offline mode: serving the built-in catalog"),
    }

    let provider = args.upstream.provider(credential.as_ref())?;
    println!(
        "Starting bridge on http://127.0.0.1:{}/v1 (provider: {})",
        settings.port,
        provider.name()
    );

    run_bridge_standalone(settings, provider, Arc::new(MemoryLogSink::new()))
        .await
        .map_err(|e| match e.downcast::<SupervisorError>() {
            Ok(supervisor_err) => supervisor_err.into(),
            Err(other) => CliError::Bridge(other.to_string()),
        })
}
