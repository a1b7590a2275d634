//! Session bookkeeping: which correlation key owns which notebook URL.
//!
//! DESIGN
//! ======
//! Sessions are keyed by [`Correlation`], so an email and a server-issued
//! session id can never collide even if their strings match. A session row
//! is created with a null URL when a launch starts and filled in once the
//! provisioner reports the notebook address.
//!
//! Two backends: [`MemoryStore`] for single-process deployments and tests,
//! [`PgStore`] when `DATABASE_URL` is configured.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use launch_client::Correlation;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One launch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub url: Option<String>,
    pub pod_name: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Written each time a container comes up for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchLogEntry {
    pub key: Correlation,
    pub started_at: OffsetDateTime,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Backend name reported by `/db_status`.
    fn backend(&self) -> &'static str;

    /// Insert a session with a null URL. Returns `false` if it already existed.
    async fn create_session(&self, key: &Correlation) -> Result<bool, StoreError>;

    async fn session(&self, key: &Correlation) -> Result<Option<SessionRecord>, StoreError>;

    async fn update_session_url(&self, key: &Correlation, url: &str, pod_name: Option<&str>) -> Result<(), StoreError>;

    async fn log_container_start(&self, key: &Correlation) -> Result<(), StoreError>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<(), StoreError>;
}

fn key_kind(key: &Correlation) -> &'static str {
    key.query_key()
}

// =============================================================================
// IN-MEMORY
// =============================================================================

#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<Correlation, SessionRecord>>>,
    logs: Arc<RwLock<Vec<LaunchLogEntry>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the launch log, oldest first.
    #[cfg(test)]
    pub async fn launch_log(&self) -> Vec<LaunchLogEntry> {
        self.logs.read().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_session(&self, key: &Correlation) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(key) {
            return Ok(false);
        }
        sessions.insert(
            key.clone(),
            SessionRecord { url: None, pod_name: None, created_at: OffsetDateTime::now_utc() },
        );
        Ok(true)
    }

    async fn session(&self, key: &Correlation) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn update_session_url(&self, key: &Correlation, url: &str, pod_name: Option<&str>) -> Result<(), StoreError> {
        if let Some(record) = self.sessions.write().await.get_mut(key) {
            record.url = Some(url.to_owned());
            record.pod_name = pod_name.map(str::to_owned);
        }
        Ok(())
    }

    async fn log_container_start(&self, key: &Correlation) -> Result<(), StoreError> {
        let entry = LaunchLogEntry { key: key.clone(), started_at: OffsetDateTime::now_utc() };
        debug!(key = %entry.key, started_at = %entry.started_at, "container start logged");
        self.logs.write().await.push(entry);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgStore {
    fn backend(&self) -> &'static str {
        "PostgreSQL"
    }

    async fn create_session(&self, key: &Correlation) -> Result<bool, StoreError> {
        let result = sqlx::query("INSERT INTO sessions (key_kind, key) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(key_kind(key))
            .bind(key.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn session(&self, key: &Correlation) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query("SELECT url, pod_name, created_at FROM sessions WHERE key_kind = $1 AND key = $2")
            .bind(key_kind(key))
            .bind(key.value())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(SessionRecord {
            url: row.try_get("url")?,
            pod_name: row.try_get("pod_name")?,
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn update_session_url(&self, key: &Correlation, url: &str, pod_name: Option<&str>) -> Result<(), StoreError> {
        sqlx::query("UPDATE sessions SET url = $1, pod_name = $2 WHERE key_kind = $3 AND key = $4")
            .bind(url)
            .bind(pod_name)
            .bind(key_kind(key))
            .bind(key.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn log_container_start(&self, key: &Correlation) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO launch_logs (key_kind, key) VALUES ($1, $2)")
            .bind(key_kind(key))
            .bind(key.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
