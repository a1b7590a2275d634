use super::*;

fn config(start: &str, list: &str) -> ProvisionConfig {
    ProvisionConfig {
        start_command: start.to_owned(),
        list_command: list.to_owned(),
        public_url: "http://lab.test:5002/".to_owned(),
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_millis(60),
    }
}

// =============================================================================
// extract_token
// =============================================================================

#[test]
fn extract_token_reads_jupyter_list_line() {
    let output = "Currently running servers:\nhttp://0.0.0.0:5002/?token=9f8e7d6c :: /workspace\n";
    assert_eq!(extract_token(output).as_deref(), Some("9f8e7d6c"));
}

#[test]
fn extract_token_stops_at_ampersand() {
    let output = "http://host:8888/lab?token=abc&x=1";
    assert_eq!(extract_token(output).as_deref(), Some("abc"));
}

#[test]
fn extract_token_ignores_lines_without_http() {
    assert_eq!(extract_token("https://host/?token=secure\n?token=bare"), None);
}

#[test]
fn extract_token_skips_empty_token_and_keeps_scanning() {
    let output = "http://a/?token= :: /x\nhttp://b/?token=second :: /y";
    assert_eq!(extract_token(output).as_deref(), Some("second"));
}

#[test]
fn extract_token_none_for_empty_output() {
    assert_eq!(extract_token(""), None);
    assert_eq!(extract_token("Currently running servers:"), None);
}

#[test]
fn notebook_url_appends_token_once() {
    assert_eq!(notebook_url("http://lab.test:5002/", "tok"), "http://lab.test:5002/?token=tok");
    assert_eq!(notebook_url("http://lab.test:5002", "tok"), "http://lab.test:5002/?token=tok");
}

// =============================================================================
// CommandProvisioner
// =============================================================================

#[tokio::test]
async fn provision_substitutes_container_and_builds_url() {
    let provisioner = CommandProvisioner::new(config(
        "echo pulling image; echo c0ffee",
        "echo 'http://0.0.0.0:5002/?token=tok-{container} :: /workspace'",
    ));
    let provisioned = provisioner.provision().await.unwrap();
    assert_eq!(provisioned.pod_name, "c0ffee");
    assert_eq!(provisioned.url, "http://lab.test:5002/?token=tok-c0ffee");
}

#[tokio::test]
async fn provision_times_out_when_token_never_appears() {
    let provisioner = CommandProvisioner::new(config("echo c1", "echo 'Currently running servers:'"));
    let err = provisioner.provision().await.unwrap_err();
    assert!(matches!(err, ProvisionError::Timeout(_)));
}

#[tokio::test]
async fn provision_reports_failed_start_command() {
    let provisioner = CommandProvisioner::new(config("echo boom >&2; exit 3", "true"));
    let err = provisioner.provision().await.unwrap_err();
    match err {
        ProvisionError::CommandFailed { stderr, .. } => assert_eq!(stderr, "boom"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn provision_requires_container_id() {
    let provisioner = CommandProvisioner::new(config("true", "true"));
    let err = provisioner.provision().await.unwrap_err();
    assert!(matches!(err, ProvisionError::NoContainerId));
}

#[tokio::test]
async fn provision_survives_failing_list_command() {
    let provisioner = CommandProvisioner::new(config("echo c1", "exit 1"));
    let err = provisioner.provision().await.unwrap_err();
    assert!(matches!(err, ProvisionError::Timeout(_)));
}

#[tokio::test]
async fn hanging_list_command_is_cut_off_at_timeout() {
    let provisioner = CommandProvisioner::new(config("echo c1", "sleep 3"));
    let started = std::time::Instant::now();
    let err = provisioner.provision().await.unwrap_err();
    assert!(matches!(err, ProvisionError::Timeout(_)));
    assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());
}
