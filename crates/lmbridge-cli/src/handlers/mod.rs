//! Command handlers.
//!
//! Each handler receives parsed options and returns a `CliError` on failure;
//! `main` maps that to an exit code.

pub mod check;
pub mod models;
pub mod serve;
pub mod setup;

use lmbridge_runtime::{Credential, discover_credential};
use tracing::debug;

use crate::config::UpstreamArgs;

/// Look up an upstream token unless the offline provider is selected.
async fn credential_for(upstream: &UpstreamArgs) -> Option<Credential> {
    if upstream.offline {
        return None;
    }
    let credential = discover_credential().await;
    debug!(found = credential.is_some(), "Credential discovery finished");
    credential
}
