use super::*;

fn email(v: &str) -> Correlation {
    Correlation::Email(v.to_owned())
}

#[tokio::test]
async fn create_session_is_idempotent() {
    let store = MemoryStore::new();
    assert!(store.create_session(&email("a@b.c")).await.unwrap());
    assert!(!store.create_session(&email("a@b.c")).await.unwrap());

    let record = store.session(&email("a@b.c")).await.unwrap().unwrap();
    assert!(record.url.is_none());
    assert!(record.pod_name.is_none());
}

#[tokio::test]
async fn email_and_session_id_keys_do_not_collide() {
    let store = MemoryStore::new();
    store.create_session(&email("same")).await.unwrap();
    store.update_session_url(&email("same"), "http://nb/?token=t", Some("c1")).await.unwrap();

    assert!(store.create_session(&Correlation::SessionId("same".into())).await.unwrap());
    let record = store.session(&Correlation::SessionId("same".into())).await.unwrap().unwrap();
    assert!(record.url.is_none());
}

#[tokio::test]
async fn update_session_url_sets_url_and_pod() {
    let store = MemoryStore::new();
    let key = Correlation::SessionId("abc123".into());
    store.create_session(&key).await.unwrap();
    store.update_session_url(&key, "http://nb/?token=t", Some("c1")).await.unwrap();

    let record = store.session(&key).await.unwrap().unwrap();
    assert_eq!(record.url.as_deref(), Some("http://nb/?token=t"));
    assert_eq!(record.pod_name.as_deref(), Some("c1"));
}

#[tokio::test]
async fn update_of_unknown_session_is_ignored() {
    let store = MemoryStore::new();
    store.update_session_url(&email("ghost@b.c"), "http://nb/", None).await.unwrap();
    assert!(store.session(&email("ghost@b.c")).await.unwrap().is_none());
}

#[tokio::test]
async fn launch_log_records_in_order() {
    let store = MemoryStore::new();
    store.log_container_start(&email("a@b.c")).await.unwrap();
    store.log_container_start(&email("z@b.c")).await.unwrap();

    let log = store.launch_log().await;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].key, email("a@b.c"));
    assert!(log[0].started_at <= log[1].started_at);
}

#[test]
fn key_kind_matches_query_key() {
    assert_eq!(key_kind(&email("a@b.c")), "email");
    assert_eq!(key_kind(&Correlation::SessionId("s1".into())), "session_id");
}

#[tokio::test]
async fn memory_backend_reports_name_and_pings() {
    let store = MemoryStore::new();
    assert_eq!(store.backend(), "memory");
    assert!(store.ping().await.is_ok());
}
