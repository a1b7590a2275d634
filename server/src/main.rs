mod config;
mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::provision::CommandProvisioner;
use services::store::{MemoryStore, SessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env();

    // Postgres when configured; otherwise sessions live only as long as the process.
    let store: Arc<dyn SessionStore> = match &config.database_url {
        Some(url) => {
            let store = db::connect_store(url, config.db_max_connections).await?;
            tracing::info!("using PostgreSQL session store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; sessions are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let provisioner = Arc::new(CommandProvisioner::new(config.provision.clone()));
    let state = state::AppState::new(store, provisioner);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!(port = config.port, "launch server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
