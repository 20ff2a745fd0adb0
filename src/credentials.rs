//! API key lookup: explicit flag, then environment, then the host secret store.

use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ProbeError, ProbeResult};

pub const API_KEY_ENV_VARS: [&str; 2] = ["XJP_API_KEY", "BACKEND_API_KEY"];

/// External command that prints the key on stdout.
#[derive(Debug, Clone)]
pub struct SecretCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Default for SecretCommand {
    fn default() -> Self {
        Self {
            program: "xjp".to_string(),
            args: ["secret", "get", "BACKEND_API_KEY", "--raw"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl SecretCommand {
    /// Runs the command. Any failure is logged and reported as `None`.
    pub async fn fetch(&self) -> Option<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Could not get API key from {}: {}", self.program, e);
                return None;
            }
            Err(_) => {
                warn!("Could not get API key from {}: timed out", self.program);
                return None;
            }
        };

        if !output.status.success() {
            debug!("{} exited with {}", self.program, output.status);
            return None;
        }

        non_blank(String::from_utf8_lossy(&output.stdout).as_ref())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Resolves the key from the real process environment.
pub async fn resolve_api_key(explicit: Option<&str>) -> ProbeResult<String> {
    resolve_api_key_with(
        explicit,
        |name| std::env::var(name).ok(),
        Some(&SecretCommand::default()),
    )
    .await
}

pub async fn resolve_api_key_with<F>(
    explicit: Option<&str>,
    env: F,
    secret: Option<&SecretCommand>,
) -> ProbeResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = explicit.and_then(non_blank) {
        return Ok(key);
    }

    for name in API_KEY_ENV_VARS {
        if let Some(key) = env(name).as_deref().and_then(non_blank) {
            debug!("API key taken from {}", name);
            return Ok(key);
        }
    }

    if let Some(cmd) = secret {
        if let Some(key) = cmd.fetch().await {
            debug!("API key taken from {}", cmd.program);
            return Ok(key);
        }
    }

    Err(ProbeError::MissingApiKey)
}
