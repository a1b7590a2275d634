use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_match_documented_schedule() {
    let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(config, ClientConfig::default());
    assert_eq!(config.poll_interval, Duration::from_millis(2000));
    assert_eq!(config.progress_interval, Duration::from_millis(200));
    assert_eq!(config.progress_step, 2);
    assert_eq!(config.progress_cap, 90);
    assert_eq!(config.redirect_delay, Duration::from_millis(500));
    assert_eq!(config.correlation_mode, CorrelationMode::Email);
    assert_eq!(config.error_surface, ErrorSurface::Log);
}

#[test]
fn overrides_are_applied() {
    let config = ClientConfig::from_lookup(lookup_from(&[
        ("LAUNCH_BASE_URL", "https://lab.example.com"),
        ("LAUNCH_CORRELATION", "session_id"),
        ("LAUNCH_ERROR_SURFACE", "alert"),
        ("LAUNCH_POLL_INTERVAL_MS", "750"),
        ("LAUNCH_PROGRESS_STEP", "5"),
        ("LAUNCH_PROGRESS_CAP", "80"),
    ]))
    .unwrap();
    assert_eq!(config.base_url, "https://lab.example.com");
    assert_eq!(config.correlation_mode, CorrelationMode::SessionId);
    assert_eq!(config.error_surface, ErrorSurface::Alert);
    assert_eq!(config.poll_interval, Duration::from_millis(750));
    assert_eq!(config.progress_step, 5);
    assert_eq!(config.progress_cap, 80);
}

#[test]
fn unparseable_numbers_are_rejected() {
    let err = ClientConfig::from_lookup(lookup_from(&[("LAUNCH_POLL_INTERVAL_MS", "soon")])).unwrap_err();
    assert!(err.to_string().contains("LAUNCH_POLL_INTERVAL_MS"));
    assert!(err.to_string().contains("soon"));
}

#[test]
fn overflowing_cap_is_rejected() {
    let err = ClientConfig::from_lookup(lookup_from(&[("LAUNCH_PROGRESS_CAP", "300")])).unwrap_err();
    assert!(matches!(err, LaunchError::Config(ref m) if m.contains("LAUNCH_PROGRESS_CAP")));
}

#[test]
fn blank_numbers_use_defaults() {
    let config = ClientConfig::from_lookup(lookup_from(&[("LAUNCH_PROGRESS_STEP", "  ")])).unwrap();
    assert_eq!(config.progress_step, DEFAULT_PROGRESS_STEP);
}

#[test]
fn zero_request_timeout_is_rejected() {
    assert!(ClientConfig::from_lookup(lookup_from(&[("LAUNCH_REQUEST_TIMEOUT_SECS", "0")])).is_err());
    let config = ClientConfig { request_timeout: Duration::ZERO, ..ClientConfig::default() };
    assert!(matches!(config.validate(), Err(LaunchError::Config(_))));
}

#[test]
fn unknown_correlation_mode_is_rejected() {
    let err = ClientConfig::from_lookup(lookup_from(&[("LAUNCH_CORRELATION", "cookie")])).unwrap_err();
    assert!(err.to_string().contains("cookie"));
}

#[test]
fn unknown_error_surface_is_rejected() {
    assert!(parse_error_surface(Some("toast")).is_err());
    assert_eq!(parse_error_surface(None).unwrap(), ErrorSurface::Log);
}

#[test]
fn correlation_mode_accepts_aliases() {
    assert_eq!(parse_correlation_mode(Some("session")).unwrap(), CorrelationMode::SessionId);
    assert_eq!(parse_correlation_mode(Some(" none ")).unwrap(), CorrelationMode::None);
}

#[test]
fn cap_of_one_hundred_is_rejected() {
    let err = ClientConfig::from_lookup(lookup_from(&[("LAUNCH_PROGRESS_CAP", "100")])).unwrap_err();
    assert!(matches!(err, LaunchError::Config(_)));
}

#[test]
fn zero_step_or_interval_is_rejected() {
    assert!(ClientConfig::from_lookup(lookup_from(&[("LAUNCH_PROGRESS_STEP", "0")])).is_err());
    assert!(ClientConfig::from_lookup(lookup_from(&[("LAUNCH_POLL_INTERVAL_MS", "0")])).is_err());
}
