//! Check command handler.
//!
//! Reports whether the bridge could start right now: a credential is
//! present and at least one upstream chat model is discoverable.

use std::time::Duration;

use super::credential_for;
use crate::config::UpstreamArgs;
use crate::error::CliError;

const DISCOVERY_DEADLINE: Duration = Duration::from_secs(20);

/// Execute the check command.
///
/// # Errors
///
/// Returns [`CliError::NotReady`] when no model can be discovered.
pub async fn execute(upstream: &UpstreamArgs) -> Result<(), CliError> {
    let credential = credential_for(upstream).await;
    if !upstream.offline {
        match &credential {
            Some(c) => println!("✓ Credential found ({})", c.source),
            None => println!(
                "✗ No credential found. Set GITHUB_TOKEN or GH_TOKEN, or run 'gh auth login'."
            ),
        }
    }

    let provider = upstream.provider(credential.as_ref())?;
    let models = match tokio::time::timeout(DISCOVERY_DEADLINE, provider.list_models()).await {
        Ok(Ok(models)) => models,
        Ok(Err(e)) => return Err(not_ready(&e.to_string())),
        Err(_) => {
            return Err(not_ready(&format!(
                "model discovery timed out after {}s",
                DISCOVERY_DEADLINE.as_secs()
            )));
        }
    };

    if models.is_empty() {
        return Err(not_ready("the upstream reported no chat models"));
    }

    println!(
        "✓ {} chat model(s) available via {}",
        models.len(),
        provider.name()
    );
    Ok(())
}

fn not_ready(reason: &str) -> CliError {
    println!("✗ {reason}");
    CliError::NotReady(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_is_ready() {
        let upstream = UpstreamArgs {
            upstream_url: String::new(),
            models: Vec::new(),
            offline: true,
        };
        assert!(execute(&upstream).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_not_ready() {
        // Port 9 (discard) on loopback refuses connections.
        let upstream = UpstreamArgs {
            upstream_url: "http://127.0.0.1:9".to_string(),
            models: Vec::new(),
            offline: false,
        };
        let err = execute(&upstream).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
