//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::error::LaunchError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 200;
pub const DEFAULT_PROGRESS_STEP: u8 = 2;
pub const DEFAULT_PROGRESS_CAP: u8 = 90;
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ALERT_MESSAGE: &str = "Failed to launch session";

/// Which value correlates poll requests with the launch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMode {
    /// Requires an email up front; polls with the echoed (or submitted) email.
    Email,
    /// Polls with the `session_id` issued by the launch response.
    SessionId,
    /// Never polls.
    None,
}

/// How failures reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSurface {
    /// Log and stop; the page stays as it is.
    Log,
    /// Raise one alert and stop. Polling is never started in this mode.
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub correlation_mode: CorrelationMode,
    pub error_surface: ErrorSurface,
    pub poll_interval: Duration,
    pub progress_interval: Duration,
    pub progress_step: u8,
    /// Highest value the cosmetic timer may reach; always below 100.
    pub progress_cap: u8,
    pub redirect_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            correlation_mode: CorrelationMode::Email,
            error_surface: ErrorSurface::Log,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            progress_interval: Duration::from_millis(DEFAULT_PROGRESS_INTERVAL_MS),
            progress_step: DEFAULT_PROGRESS_STEP,
            progress_cap: DEFAULT_PROGRESS_CAP,
            redirect_delay: Duration::from_millis(DEFAULT_REDIRECT_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `LAUNCH_BASE_URL`: default `http://127.0.0.1:5000`
    /// - `LAUNCH_CORRELATION`: `email` (default), `session_id` or `none`
    /// - `LAUNCH_ERROR_SURFACE`: `log` (default) or `alert`
    /// - `LAUNCH_POLL_INTERVAL_MS`: default 2000
    /// - `LAUNCH_PROGRESS_INTERVAL_MS`: default 200
    /// - `LAUNCH_PROGRESS_STEP`: default 2
    /// - `LAUNCH_PROGRESS_CAP`: default 90
    /// - `LAUNCH_REDIRECT_DELAY_MS`: default 500
    /// - `LAUNCH_REQUEST_TIMEOUT_SECS`: default 30
    ///
    /// # Errors
    ///
    /// Returns an error for unknown enum values, numbers that do not parse
    /// or overflow, and values rejected by [`ClientConfig::validate`].
    pub fn from_env() -> Result<Self, LaunchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown enum values, numbers that do not parse
    /// or overflow, and values rejected by [`ClientConfig::validate`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LaunchError> {
        let parse_u64 = |key: &str, default: u64| parse_number(&lookup, key, default);
        let parse_u8 = |key: &str, default: u8| parse_number(&lookup, key, default);

        let config = Self {
            base_url: lookup("LAUNCH_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            correlation_mode: parse_correlation_mode(lookup("LAUNCH_CORRELATION").as_deref())?,
            error_surface: parse_error_surface(lookup("LAUNCH_ERROR_SURFACE").as_deref())?,
            poll_interval: Duration::from_millis(parse_u64("LAUNCH_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?),
            progress_interval: Duration::from_millis(parse_u64(
                "LAUNCH_PROGRESS_INTERVAL_MS",
                DEFAULT_PROGRESS_INTERVAL_MS,
            )?),
            progress_step: parse_u8("LAUNCH_PROGRESS_STEP", DEFAULT_PROGRESS_STEP)?,
            progress_cap: parse_u8("LAUNCH_PROGRESS_CAP", DEFAULT_PROGRESS_CAP)?,
            redirect_delay: Duration::from_millis(parse_u64("LAUNCH_REDIRECT_DELAY_MS", DEFAULT_REDIRECT_DELAY_MS)?),
            request_timeout: Duration::from_secs(parse_u64(
                "LAUNCH_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the launch flow relies on.
    ///
    /// # Errors
    ///
    /// Returns an error when an interval or the request timeout is zero, the
    /// step is zero, or the cap would let the cosmetic timer reach
    /// completion on its own.
    pub fn validate(&self) -> Result<(), LaunchError> {
        if self.poll_interval.is_zero() || self.progress_interval.is_zero() {
            return Err(LaunchError::Config("poll and progress intervals must be non-zero".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(LaunchError::Config("request timeout must be non-zero".into()));
        }
        if self.progress_step == 0 {
            return Err(LaunchError::Config("progress step must be at least 1".into()));
        }
        if self.progress_cap >= 100 {
            return Err(LaunchError::Config(format!(
                "progress cap must be below 100, got {}",
                self.progress_cap
            )));
        }
        Ok(())
    }
}

/// Unset or blank keys take `default`; anything else must parse as `T`.
fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, LaunchError> {
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<T>()
        .map_err(|_| LaunchError::Config(format!("invalid {key} '{}'", raw.trim())))
}

/// Parse a correlation mode name. `None` input selects the default.
///
/// # Errors
///
/// Returns an error for unrecognized names.
pub fn parse_correlation_mode(raw: Option<&str>) -> Result<CorrelationMode, LaunchError> {
    match raw.map_or("email", str::trim) {
        "email" => Ok(CorrelationMode::Email),
        "session_id" | "session" => Ok(CorrelationMode::SessionId),
        "none" => Ok(CorrelationMode::None),
        other => Err(LaunchError::Config(format!(
            "unknown LAUNCH_CORRELATION '{other}' (expected 'email', 'session_id' or 'none')"
        ))),
    }
}

/// Parse an error surface name. `None` input selects the default.
///
/// # Errors
///
/// Returns an error for unrecognized names.
pub fn parse_error_surface(raw: Option<&str>) -> Result<ErrorSurface, LaunchError> {
    match raw.map_or("log", str::trim) {
        "log" => Ok(ErrorSurface::Log),
        "alert" => Ok(ErrorSurface::Alert),
        other => Err(LaunchError::Config(format!(
            "unknown LAUNCH_ERROR_SURFACE '{other}' (expected 'log' or 'alert')"
        ))),
    }
}
