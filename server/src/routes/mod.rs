//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the two launch endpoints used by the launch client plus health and
//! database status probes under a single Axum router.

pub mod launch;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/launch", post(launch::launch))
        .route("/get_url", get(launch::get_url))
        .route("/db_status", get(db_status))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /db_status`: report which session store is active and whether it answers.
async fn db_status(State(state): State<AppState>) -> Response {
    let database = state.store.backend();
    match state.store.ping().await {
        Ok(()) => Json(serde_json::json!({ "status": "connected", "database": database })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "status": "error", "database": database, "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
