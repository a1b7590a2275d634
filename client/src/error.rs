//! Client error type.

/// Errors produced while talking to the launch service.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The configured base URL is not an absolute http(s) URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status and a non-JSON body.
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// A success response carried a body that is not the expected JSON.
    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A configuration value was out of range or unrecognized.
    #[error("config parse failed: {0}")]
    Config(String),
}
