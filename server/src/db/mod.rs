//! Postgres backing for the session store.
//!
//! Only reached when `DATABASE_URL` is set. The pool is sized from
//! [`ServerConfig::db_max_connections`](crate::config::ServerConfig) and the
//! `sessions` / `launch_logs` schema is applied before the router accepts
//! traffic.

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::services::store::PgStore;

/// Connect, migrate, and wrap the pool as a [`PgStore`].
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn connect_store(database_url: &str, max_connections: u32) -> Result<PgStore, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    info!(max_connections, "session schema ready");
    Ok(PgStore::new(pool))
}
