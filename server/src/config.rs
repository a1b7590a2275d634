//! Server configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_PROVISION_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_PROVISION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:5002";

/// Starts the notebook container detached; its stdout is the container id.
const DEFAULT_START_COMMAND: &str = "docker run -d \
    --cap-add SYS_PTRACE --security-opt seccomp=unconfined \
    --device /dev/kfd --device /dev/dri --group-add video \
    --ipc host --network host --shm-size 32G \
    -v /:/workspace \
    rocm/vllm-dev:20250112 /bin/sh -c \
    \"pip install jupyter && jupyter lab --ip=0.0.0.0 --port=5002 --allow-root \
    --NotebookApp.allow_origin='https://colab.research.google.com'\"";

/// Lists running notebook servers inside the container.
const DEFAULT_LIST_COMMAND: &str = "docker exec -u root {container} jupyter notebook list";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Postgres URL. The in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Postgres pool size; at least 1.
    pub db_max_connections: u32,
    pub provision: ProvisionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub start_command: String,
    /// `{container}` is replaced with the id printed by `start_command`.
    pub list_command: String,
    /// Externally reachable notebook root; the token is appended as `/?token=`.
    pub public_url: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            start_command: DEFAULT_START_COMMAND.to_owned(),
            list_command: DEFAULT_LIST_COMMAND.to_owned(),
            public_url: DEFAULT_PUBLIC_URL.to_owned(),
            poll_interval: Duration::from_secs(DEFAULT_PROVISION_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_PROVISION_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Build server config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 5000
    /// - `DATABASE_URL`: Postgres store when set, in-memory otherwise
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `PROVISION_START_CMD`, `PROVISION_LIST_CMD`, `PROVISION_PUBLIC_URL`
    /// - `PROVISION_POLL_INTERVAL_SECS`: default 5
    /// - `PROVISION_TIMEOUT_SECS`: default 30
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ProvisionConfig::default();
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provision = ProvisionConfig {
            start_command: non_blank("PROVISION_START_CMD").unwrap_or(defaults.start_command),
            list_command: non_blank("PROVISION_LIST_CMD").unwrap_or(defaults.list_command),
            public_url: non_blank("PROVISION_PUBLIC_URL")
                .map_or(defaults.public_url, |v| v.trim().trim_end_matches('/').to_owned()),
            poll_interval: Duration::from_secs(env_parse(
                &lookup,
                "PROVISION_POLL_INTERVAL_SECS",
                DEFAULT_PROVISION_POLL_INTERVAL_SECS,
            )),
            timeout: Duration::from_secs(env_parse(&lookup, "PROVISION_TIMEOUT_SECS", DEFAULT_PROVISION_TIMEOUT_SECS)),
        };

        Self {
            port: env_parse(&lookup, "PORT", DEFAULT_PORT),
            database_url: non_blank("DATABASE_URL"),
            db_max_connections: env_parse(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS).max(1),
            provision,
        }
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
