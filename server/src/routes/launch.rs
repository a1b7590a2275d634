//! Launch routes: `POST /launch` and `GET /get_url`.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use launch_client::api::GetUrlQuery;
use launch_client::{Correlation, LaunchRequest, LaunchResponse};
use tracing::error;

use crate::services::launch::{self as launch_svc, LAUNCHING_MESSAGE, LaunchDecision};
use crate::services::store::StoreError;
use crate::state::AppState;

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = LaunchResponse { error: Some(message.to_owned()), ..LaunchResponse::default() };
    (status, Json(body)).into_response()
}

fn store_error_response(err: &StoreError) -> Response {
    error!(error = %err, "session store failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "session store unavailable")
}

/// Empty or whitespace-only bodies are an anonymous launch.
pub(crate) fn parse_launch_body(body: &[u8]) -> Result<LaunchRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LaunchRequest::default());
    }
    serde_json::from_slice(body)
}

/// Map a request to its correlation key: the email when one is given, a
/// fresh session id otherwise. `Err` carries the rejection message.
pub(crate) fn launch_key(request: &LaunchRequest) -> Result<Correlation, &'static str> {
    match request.email.as_deref().map(str::trim) {
        Some("") => Err("email required"),
        Some(email) => Ok(Correlation::Email(email.to_owned())),
        None => Ok(Correlation::SessionId(launch_svc::new_session_id())),
    }
}

/// `POST /launch`: return the notebook URL or start provisioning.
pub async fn launch(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_launch_body(&body) {
        Ok(request) => request,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "invalid JSON body"),
    };
    let key = match launch_key(&request) {
        Ok(key) => key,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let decision = match launch_svc::begin_launch(&state, key).await {
        Ok(decision) => decision,
        Err(e) => return store_error_response(&e),
    };

    let body = match decision {
        LaunchDecision::Ready(url) => LaunchResponse { url: Some(url), ..LaunchResponse::default() },
        LaunchDecision::Started(Correlation::Email(email)) => LaunchResponse {
            message: Some(LAUNCHING_MESSAGE.to_owned()),
            email: Some(email),
            ..LaunchResponse::default()
        },
        LaunchDecision::Started(Correlation::SessionId(session_id)) => LaunchResponse {
            message: Some(LAUNCHING_MESSAGE.to_owned()),
            session_id: Some(session_id),
            ..LaunchResponse::default()
        },
    };
    Json(body).into_response()
}

/// `GET /get_url?email=..|session_id=..`: current URL, `null` until ready.
pub async fn get_url(State(state): State<AppState>, Query(query): Query<GetUrlQuery>) -> Response {
    let key = query.correlation();
    match launch_svc::lookup_url(&state, key.as_ref()).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => store_error_response(&e),
    }
}

#[cfg(test)]
#[path = "launch_test.rs"]
mod tests;
