//! Bearer token discovery for the GitHub Models upstream.
//!
//! Lookup order: `GITHUB_TOKEN`, then `GH_TOKEN`, then `gh auth token`.
//! A missing token is not an error here; the upstream answers 401 and the
//! bridge maps that to a permission fault.

use std::fmt;

use tokio::process::Command;
use tracing::debug;

const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Where a token was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Environment variable with this name.
    Env(&'static str),
    /// The `gh` CLI's stored login.
    GhCli,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env(var) => write!(f, "${var}"),
            Self::GhCli => write!(f, "gh auth token"),
        }
    }
}

/// A discovered bearer token.
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub source: CredentialSource,
}

// Keep tokens out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Discover a token from the process environment or the `gh` CLI.
pub async fn discover_credential() -> Option<Credential> {
    if let Some(credential) = credential_from_env(|var| std::env::var(var).ok()) {
        return Some(credential);
    }
    credential_from_gh_cli().await
}

fn credential_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<Credential> {
    TOKEN_ENV_VARS.iter().find_map(|&var| {
        lookup(var)
            .map(|value| value.trim().to_string())
            .filter(|token| !token.is_empty())
            .map(|token| Credential {
                token,
                source: CredentialSource::Env(var),
            })
    })
}

async fn credential_from_gh_cli() -> Option<Credential> {
    let output = match Command::new("gh").args(["auth", "token"]).output().await {
        Ok(output) => output,
        Err(e) => {
            debug!("gh CLI not available: {e}");
            return None;
        }
    };

    if !output.status.success() {
        debug!(status = %output.status, "gh auth token failed");
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(Credential {
        token,
        source: CredentialSource::GhCli,
    })
}
