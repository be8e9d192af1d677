use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use content::{ContentService, EngineConfig, EventKind, State, Webhook};
use storage::MemoryBackend;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "acme";

fn service() -> ContentService {
    ContentService::new(Arc::new(MemoryBackend::new()), EngineConfig::default())
}

fn hook(id: &str, url: String, events: &[&str]) -> Webhook {
    Webhook {
        id: id.to_string(),
        url,
        events: events.iter().map(|e| e.to_string()).collect(),
    }
}

async fn requests_eventually(server: &MockServer, expected: usize) -> Vec<wiremock::Request> {
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap();
        if received.len() >= expected {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {expected} webhook deliveries");
}

#[tokio::test]
async fn webhook_store_crud() {
    let svc = service();
    let webhook = hook("w1", "https://example.com/sink".to_string(), &["create", "publish"]);

    svc.webhooks().put_webhook(TENANT, &webhook).await.unwrap();
    let fetched = svc.webhooks().get_webhook(TENANT, "w1").await.unwrap();
    assert_eq!(fetched.url, "https://example.com/sink");
    assert_eq!(fetched.events, vec!["create", "publish"]);

    assert_eq!(svc.webhooks().list_webhooks(TENANT).await.unwrap().len(), 1);
    assert!(svc.webhooks().list_webhooks("other").await.unwrap().is_empty());

    svc.webhooks().delete_webhook(TENANT, "w1").await.unwrap();
    assert!(svc.webhooks().get_webhook(TENANT, "w1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn emit_delivers_to_subscribed_sinks_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subscribed"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/unsubscribed"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let svc = service();
    svc.webhooks()
        .put_webhook(
            TENANT,
            &hook("yes", format!("{}/subscribed", server.uri()), &["create"]),
        )
        .await
        .unwrap();
    svc.webhooks()
        .put_webhook(
            TENANT,
            &hook("no", format!("{}/unsubscribed", server.uri()), &["delete"]),
        )
        .await
        .unwrap();

    svc.emit_event(TENANT, EventKind::Create, "articles", "hello", "application/json");

    let received = requests_eventually(&server, 1).await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].url.path(), "/subscribed");

    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["event"], "create");
    assert_eq!(body["tenant"], TENANT);
    assert_eq!(body["type"], "articles");
    assert_eq!(body["id"], "hello");
    assert_eq!(body["content-type"], "application/json");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn publish_transition_emits_a_publish_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let svc = service();
    svc.webhooks()
        .put_webhook(TENANT, &hook("w", server.uri(), &["publish"]))
        .await
        .unwrap();

    svc.store()
        .put(
            TENANT,
            "articles",
            "hello",
            "json",
            Bytes::from_static(b"{}"),
            "application/json",
            State::Draft,
            None,
        )
        .await
        .unwrap();
    svc.workflow()
        .transition(TENANT, "articles", "hello", "json", State::Draft, State::Live, "a", "m")
        .await
        .unwrap();

    let received = requests_eventually(&server, 1).await;
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["event"], "publish");
    assert_eq!(body["id"], "hello");
}

#[tokio::test]
async fn events_stay_within_their_tenant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let svc = service();
    svc.webhooks()
        .put_webhook("other-tenant", &hook("w", server.uri(), &["create"]))
        .await
        .unwrap();

    svc.emit_event(TENANT, EventKind::Create, "articles", "hello", "application/json");

    // Give the fire-and-forget path time to (not) deliver.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(server.received_requests().await.unwrap().is_empty());
}
