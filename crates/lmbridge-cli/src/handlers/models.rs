//! Models command handler.

use std::fmt::Write as _;

use lmbridge_core::ModelDescriptor;

use super::credential_for;
use crate::config::UpstreamArgs;
use crate::error::CliError;

/// Execute the models command.
///
/// Prints every chat model the upstream currently offers, in discovery
/// order. The first entry is what the bridge falls back to.
pub async fn execute(upstream: &UpstreamArgs) -> Result<(), CliError> {
    let credential = credential_for(upstream).await;
    let provider = upstream.provider(credential.as_ref())?;
    let models = provider.list_models().await?;

    if models.is_empty() {
        println!("No chat models available from {}.", provider.name());
        return Ok(());
    }

    print!("{}", format_models(&models));
    Ok(())
}

fn format_models(models: &[ModelDescriptor]) -> String {
    let width = models
        .iter()
        .map(|m| m.id.len())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    let mut out = format!("{:<width$}  VENDOR\n", "ID");
    for model in models {
        let _ = writeln!(out, "{:<width$}  {}", model.id, model.vendor);
    }
    out
}
