//! Wire types and HTTP transport for the launch and URL-polling endpoints.
//!
//! DESIGN
//! ======
//! The service exposes exactly two routes: `POST /launch` and
//! `GET /get_url`. Both answer with loosely-populated JSON objects, so every
//! response field is optional and absent fields deserialize to `None`.
//!
//! ERROR HANDLING
//! ==============
//! A non-success status whose body still parses as the expected object is
//! returned as a normal response so callers can read its `error` field. Only
//! bodies that fail to parse become [`LaunchError::Status`].

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LaunchError;

pub const LAUNCH_PATH: &str = "/launch";
pub const GET_URL_PATH: &str = "/get_url";

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Body of `POST /launch`. Sent only when an email is supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Response of `POST /launch`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchResponse {
    /// Notebook URL when the session is already provisioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Human-readable status, e.g. "Pod is launching, please wait...".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Server-issued correlation id for anonymous launches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Echo of the submitted email for email-keyed launches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `GET /get_url`. Both fields serialize as `null` until the
/// notebook is ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pod_name: Option<String>,
}

/// Query string of `GET /get_url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUrlQuery {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl GetUrlQuery {
    /// Resolve the correlation value carried by the query. Email wins when
    /// both keys are present; blank values count as absent.
    #[must_use]
    pub fn correlation(&self) -> Option<Correlation> {
        let non_blank = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);
        non_blank(&self.email)
            .map(Correlation::Email)
            .or_else(|| non_blank(&self.session_id).map(Correlation::SessionId))
    }
}

// =============================================================================
// CORRELATION
// =============================================================================

/// Value linking a poll request to the launch request that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Correlation {
    Email(String),
    SessionId(String),
}

impl Correlation {
    /// Query parameter name used by `GET /get_url`.
    #[must_use]
    pub fn query_key(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::SessionId(_) => "session_id",
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Email(v) | Self::SessionId(v) => v,
        }
    }

    #[must_use]
    pub fn query_pair(&self) -> (&'static str, &str) {
        (self.query_key(), self.value())
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.query_key(), self.value())
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Transport for the two launch-service calls.
#[async_trait]
pub trait LaunchApi: Send + Sync {
    /// `POST /launch`, with a `{email}` body when `email` is given.
    async fn launch(&self, email: Option<&str>) -> Result<LaunchResponse, LaunchError>;

    /// `GET /get_url` keyed by the correlation value.
    async fn get_url(&self, correlation: &Correlation) -> Result<UrlResponse, LaunchError>;
}

/// [`LaunchApi`] over HTTP using `reqwest`.
pub struct HttpLaunchApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLaunchApi {
    /// Build a transport for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not absolute http(s) or the HTTP
    /// client cannot be constructed.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, LaunchError> {
        let base_url = normalize_base_url(base_url)?;
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LaunchApi for HttpLaunchApi {
    async fn launch(&self, email: Option<&str>) -> Result<LaunchResponse, LaunchError> {
        let mut request = self.client.post(endpoint(&self.base_url, LAUNCH_PATH));
        if let Some(email) = email {
            request = request.json(&LaunchRequest { email: Some(email.to_owned()) });
        }
        let response = request.send().await?;
        read_json(response).await
    }

    async fn get_url(&self, correlation: &Correlation) -> Result<UrlResponse, LaunchError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, GET_URL_PATH))
            .query(&[correlation.query_pair()])
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, LaunchError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    decode_body(status, &body)
}

fn decode_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, LaunchError> {
    match serde_json::from_str::<T>(body) {
        Ok(value) => Ok(value),
        Err(e) if (200..300).contains(&status) => Err(LaunchError::Decode(e)),
        Err(_) => Err(LaunchError::Status { status, body: body.to_owned() }),
    }
}

fn normalize_base_url(raw: &str) -> Result<String, LaunchError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    match host {
        Some(host) if !host.is_empty() => Ok(trimmed.to_owned()),
        _ => Err(LaunchError::InvalidBaseUrl(raw.to_owned())),
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{base_url}{path}")
}
