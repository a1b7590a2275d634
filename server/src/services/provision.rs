//! Notebook provisioning: start a container and discover its tokenised URL.
//!
//! DESIGN
//! ======
//! [`CommandProvisioner`] shells out twice. The start command launches the
//! container detached and prints its id; the list command (with
//! `{container}` substituted) prints the running notebook servers. The list
//! output is scanned every `poll_interval` until a `?token=` appears on an
//! `http://` line or `timeout` elapses. A list run still going at the
//! deadline is killed.
//!
//! The notebook's own address is container-internal, so only the token is
//! kept and the public URL is rebuilt from configuration.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::ProvisionConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed { command: String, status: String, stderr: String },
    #[error("start command printed no container id")]
    NoContainerId,
    #[error("notebook token not found within {0:?}")]
    Timeout(Duration),
}

/// A running notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub pod_name: String,
    pub url: String,
}

#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self) -> Result<Provisioned, ProvisionError>;
}

pub struct CommandProvisioner {
    config: ProvisionConfig,
}

impl CommandProvisioner {
    #[must_use]
    pub fn new(config: ProvisionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Provisioner for CommandProvisioner {
    async fn provision(&self) -> Result<Provisioned, ProvisionError> {
        let started = run_shell(&self.config.start_command).await?;
        let container = started
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .ok_or(ProvisionError::NoContainerId)?
            .to_owned();
        info!(%container, "notebook container started");

        let list_command = self.config.list_command.replace("{container}", &container);
        let deadline = Instant::now() + self.config.timeout;
        loop {
            let Ok(listed) = time::timeout_at(deadline, run_shell(&list_command)).await else {
                warn!(%container, "notebook list command still running at deadline");
                return Err(ProvisionError::Timeout(self.config.timeout));
            };
            match listed {
                Ok(output) => {
                    if let Some(token) = extract_token(&output) {
                        let url = notebook_url(&self.config.public_url, &token);
                        info!(%container, "notebook server ready");
                        return Ok(Provisioned { pod_name: container, url });
                    }
                    debug!(%container, "notebook server not listed yet");
                }
                Err(e) => warn!(%container, error = %e, "notebook list failed"),
            }
            if Instant::now() >= deadline {
                return Err(ProvisionError::Timeout(self.config.timeout));
            }
            time::sleep_until((Instant::now() + self.config.poll_interval).min(deadline)).await;
        }
    }
}

async fn run_shell(command: &str) -> Result<String, ProvisionError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ProvisionError::Spawn { command: command.to_owned(), source })?;

    if !output.status.success() {
        return Err(ProvisionError::CommandFailed {
            command: command.to_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// First `?token=` value on a line that mentions `http://`. The token runs
/// until whitespace or `&`.
pub(crate) fn extract_token(output: &str) -> Option<String> {
    const MARKER: &str = "?token=";
    output
        .lines()
        .filter(|line| line.contains("http://"))
        .find_map(|line| {
            let start = line.find(MARKER)? + MARKER.len();
            let token: String = line[start..]
                .chars()
                .take_while(|c| !c.is_whitespace() && *c != '&')
                .collect();
            (!token.is_empty()).then_some(token)
        })
}

pub(crate) fn notebook_url(public_url: &str, token: &str) -> String {
    format!("{}/?token={token}", public_url.trim_end_matches('/'))
}

#[cfg(test)]
#[path = "provision_test.rs"]
mod tests;
