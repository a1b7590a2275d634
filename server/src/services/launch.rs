//! Launch orchestration behind `/launch` and `/get_url`.
//!
//! ARCHITECTURE
//! ============
//! A launch either returns an existing notebook URL or records a session with
//! a null URL and spawns provisioning in the background. The client then
//! polls until the background task writes the URL back to the store.
//!
//! ERROR HANDLING
//! ==============
//! Provisioning runs detached from any request, so its failures are only
//! logged. The session keeps a null URL and a later launch for the same key
//! retries provisioning.

use std::fmt::Write;

use launch_client::{Correlation, UrlResponse};
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::services::store::StoreError;
use crate::state::AppState;

pub const LAUNCHING_MESSAGE: &str = "Pod is launching, please wait...";

/// What a launch request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchDecision {
    /// The session already has a notebook.
    Ready(String),
    /// Provisioning is underway for this key.
    Started(Correlation),
}

/// Resolve a launch for `key`, spawning provisioning when no URL exists yet.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn begin_launch(state: &AppState, key: Correlation) -> Result<LaunchDecision, StoreError> {
    match state.store.session(&key).await? {
        Some(record) => {
            if let Some(url) = record.url {
                debug!(%key, "session already has a notebook");
                return Ok(LaunchDecision::Ready(url));
            }
            debug!(%key, created_at = %record.created_at, "session still waiting for a notebook");
        }
        None => {
            if state.store.create_session(&key).await? {
                info!(%key, "session created");
            }
        }
    }
    let _task = spawn_provisioning(state.clone(), key.clone());
    Ok(LaunchDecision::Started(key))
}

/// Start provisioning for `key` unless a task for it is already running.
pub fn spawn_provisioning(state: AppState, key: Correlation) -> Option<JoinHandle<()>> {
    if !state.claim_provisioning(&key) {
        debug!(%key, "provisioning already in flight");
        return None;
    }
    Some(tokio::spawn(async move {
        run_provisioning(&state, &key).await;
        state.release_provisioning(&key);
    }))
}

async fn run_provisioning(state: &AppState, key: &Correlation) {
    // A task for this key may have finished between the caller's lookup and
    // our claim.
    match state.store.session(key).await {
        Ok(Some(record)) if record.url.is_some() => {
            debug!(%key, "notebook already recorded; skipping provisioning");
            return;
        }
        Ok(_) => {}
        Err(e) => {
            error!(%key, error = %e, "session lookup failed before provisioning");
            return;
        }
    }

    let provisioned = match state.provisioner.provision().await {
        Ok(provisioned) => provisioned,
        Err(e) => {
            error!(%key, error = %e, "provisioning failed");
            return;
        }
    };

    if let Err(e) = state
        .store
        .update_session_url(key, &provisioned.url, Some(&provisioned.pod_name))
        .await
    {
        error!(%key, error = %e, "failed to record notebook url");
        return;
    }
    if let Err(e) = state.store.log_container_start(key).await {
        warn!(%key, error = %e, "failed to write launch log");
    }
    info!(%key, pod_name = %provisioned.pod_name, "notebook ready");
}

/// Current URL for `key`; both fields are `None` for unknown or missing keys.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn lookup_url(state: &AppState, key: Option<&Correlation>) -> Result<UrlResponse, StoreError> {
    let Some(key) = key else {
        return Ok(UrlResponse::default());
    };
    let record = state.store.session(key).await?;
    Ok(record.map_or_else(UrlResponse::default, |r| UrlResponse { url: r.url, pod_name: r.pod_name }))
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Random 16-byte hex id for launches that arrive without an email.
#[must_use]
pub fn new_session_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes_to_hex(&bytes)
}

#[cfg(test)]
#[path = "launch_test.rs"]
mod tests;
