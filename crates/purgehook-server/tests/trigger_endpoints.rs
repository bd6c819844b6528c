use std::time::Duration;

use purgehook_dispatch::{DispatchConfig, InvalidationDispatcher};
use purgehook_server::build_app;
use serde_json::Value;
use tokio::task::JoinHandle;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn start_server(
    dispatcher: InvalidationDispatcher,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let app = build_app(dispatcher);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

async fn webhook() -> MockServer {
    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&hook)
        .await;
    hook
}

fn dispatcher_for(hook: &MockServer) -> InvalidationDispatcher {
    let config = DispatchConfig::new(format!("{}/purge", hook.uri()), "https://blog.example.com")
        .with_body_template(r#"{"urls": ${urls}, "purgeAll": ${purgeAll}, "pattern": ${pattern}}"#)
        .with_debounce_ms(100)
        .with_retries(1, 0);
    InvalidationDispatcher::new(config).expect("dispatcher")
}

#[tokio::test]
async fn invalidate_header_schedules_one_webhook_per_burst() {
    let hook = webhook().await;
    let (base, shutdown_tx, handle) = start_server(dispatcher_for(&hook)).await;
    let client = reqwest::Client::new();

    for pattern in ["/a", "/b", "/$/"] {
        let resp = client
            .post(format!("{base}/invalidate"))
            .header("X-Cache-Invalidate", pattern)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "scheduled");
        assert_eq!(body["pattern"], pattern);
    }

    let health: Value = client
        .get(format!("{base}/healthz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["pending"], true);

    tokio::time::sleep(Duration::from_millis(500)).await;

    let received = hook.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let payload: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(payload["purgeAll"], true);
    assert_eq!(payload["pattern"], "/$/");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn invalidate_accepts_json_body() {
    let hook = webhook().await;
    let (base, shutdown_tx, handle) = start_server(dispatcher_for(&hook)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/invalidate"))
        .header("content-type", "application/json")
        .body(r#"{"pattern": "/about, /rss"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);

    tokio::time::sleep(Duration::from_millis(500)).await;

    let received = hook.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let payload: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(
        payload["urls"],
        serde_json::json!(["https://blog.example.com/about", "https://blog.example.com/rss"])
    );

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn invalidate_without_pattern_is_rejected() {
    let hook = webhook().await;
    let (base, shutdown_tx, handle) = start_server(dispatcher_for(&hook)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/invalidate"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("x-cache-invalidate"));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
