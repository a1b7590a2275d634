//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the session store, the provisioner, and the set of keys whose
//! provisioning task is still running, so repeated launches for the same
//! key never start a second container.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use launch_client::Correlation;

use crate::services::provision::Provisioner;
use crate::services::store::SessionStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub provisioner: Arc<dyn Provisioner>,
    provisioning: Arc<Mutex<HashSet<Correlation>>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, provisioner: Arc<dyn Provisioner>) -> Self {
        Self { store, provisioner, provisioning: Arc::new(Mutex::new(HashSet::new())) }
    }

    /// Mark `key` as being provisioned. Returns `false` if it already was.
    pub fn claim_provisioning(&self, key: &Correlation) -> bool {
        let mut set = self.provisioning.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        set.insert(key.clone())
    }

    pub fn release_provisioning(&self, key: &Correlation) {
        let mut set = self.provisioning.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        set.remove(key);
    }

    #[cfg(test)]
    #[must_use]
    pub fn is_provisioning(&self, key: &Correlation) -> bool {
        self.provisioning
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(key)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::services::provision::{ProvisionError, Provisioned};
    use crate::services::store::MemoryStore;

    /// Provisioner that succeeds with a fixed notebook once released.
    pub struct FakeProvisioner {
        pub url: String,
        pub pod_name: String,
        pub calls: Mutex<usize>,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    impl FakeProvisioner {
        #[must_use]
        pub fn ready(url: &str) -> Self {
            Self { url: url.to_owned(), pod_name: "pod-test".into(), calls: Mutex::new(0), gate: None, fail: false }
        }

        /// Blocks inside `provision` until `gate` is notified.
        #[must_use]
        pub fn gated(url: &str, gate: Arc<Notify>) -> Self {
            Self { gate: Some(gate), ..Self::ready(url) }
        }

        #[must_use]
        pub fn failing() -> Self {
            Self { fail: true, ..Self::ready("") }
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provisioner for FakeProvisioner {
        async fn provision(&self) -> Result<Provisioned, ProvisionError> {
            *self.calls.lock().unwrap() += 1;
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(ProvisionError::NoContainerId);
            }
            Ok(Provisioned { pod_name: self.pod_name.clone(), url: self.url.clone() })
        }
    }

    /// `AppState` over a fresh in-memory store; the store handle is returned
    /// for direct inspection.
    #[must_use]
    pub fn test_app_state(provisioner: Arc<dyn Provisioner>) -> (AppState, MemoryStore) {
        let store = MemoryStore::new();
        (AppState::new(Arc::new(store.clone()), provisioner), store)
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
