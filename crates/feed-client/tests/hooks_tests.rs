//! Integration tests for the data and summary hooks.

use std::sync::Arc;
use std::time::Duration;

use feed_client::{ApiClient, DataHook, FetchError, SummaryHook};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Address on which nothing is listening.
fn closed_addr() -> std::net::SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn summary_body(username: &str) -> Value {
    json!({
        "me": {"id": "u1", "username": username},
        "followers": [{"id": "u2", "username": "bob"}],
        "following": [],
        "likes": {"posts": ["p1", "p2"], "postMeta": []},
        "saves": {"posts": [], "postMeta": []},
        "mentions": []
    })
}

// =============================================================================
// DataHook
// =============================================================================

#[tokio::test]
async fn test_data_hook_loads_url() {
    let server = MockServer::start().await;
    Mock::given(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": []})))
        .mount(&server)
        .await;

    let hook: DataHook<Value> = DataHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    assert!(!hook.state().loading);

    let handle = hook.set_url("/api/posts").unwrap();
    assert!(hook.state().loading);
    handle.await.unwrap();

    let state = hook.state();
    assert!(!state.loading);
    assert_eq!(state.data, Some(json!({"posts": []})));
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_data_hook_same_url_does_not_refetch() {
    let server = MockServer::start().await;
    Mock::given(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let hook: DataHook<Value> = DataHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    hook.set_url("/api/posts").unwrap().await.unwrap();
    assert!(hook.set_url("/api/posts").is_none());
    assert_eq!(hook.url().as_deref(), Some("/api/posts"));
}

#[tokio::test]
async fn test_data_hook_discards_stale_response() {
    let server = MockServer::start().await;
    Mock::given(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"from": "a"}))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"from": "b"})))
        .mount(&server)
        .await;

    let hook: DataHook<Value> = DataHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    let slow = hook.set_url("/a").unwrap();
    let fast = hook.set_url("/b").unwrap();

    fast.await.unwrap();
    assert_eq!(hook.state().data, Some(json!({"from": "b"})));

    // A resolves last and must not overwrite B
    slow.await.unwrap();
    let state = hook.state();
    assert_eq!(state.data, Some(json!({"from": "b"})));
    assert!(!state.loading);
}

#[tokio::test]
async fn test_data_hook_unmount_ignores_late_result() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(1))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let hook: DataHook<Value> = DataHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    let mut updates = hook.subscribe();
    let handle = hook.set_url("/slow").unwrap();
    hook.unmount();

    handle.await.unwrap();
    let state = updates.borrow_and_update().clone();
    assert_eq!(state.data, None);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_data_hook_surfaces_errors() {
    let server = MockServer::start().await;
    Mock::given(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let hook: DataHook<Value> = DataHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    hook.set_url("/busy").unwrap().await.unwrap();

    let state = hook.state();
    assert_eq!(state.data, None);
    assert_eq!(state.error, Some(FetchError::RateLimited));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_data_hook_concurrent_url_changes_settle_on_bound_url() {
    let server = MockServer::start().await;
    for route in ["/a", "/b"] {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"from": route})))
            .mount(&server)
            .await;
    }

    let hook: Arc<DataHook<Value>> =
        Arc::new(DataHook::new(ApiClient::with_base_url(&server.uri()).unwrap()));

    for _ in 0..50 {
        let tasks: Vec<_> = ["/a", "/b"]
            .into_iter()
            .map(|route| {
                let hook = Arc::clone(&hook);
                tokio::spawn(async move { hook.set_url(route) })
            })
            .collect();

        for task in tasks {
            if let Some(fetch) = task.await.unwrap() {
                fetch.await.unwrap();
            }
        }

        let bound = hook.url().unwrap();
        let state = hook.state();
        assert!(!state.loading);
        assert_eq!(state.data, Some(json!({"from": bound})));
    }
}

// =============================================================================
// SummaryHook
// =============================================================================

#[tokio::test]
async fn test_summary_hook_empty_token_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("alice")))
        .expect(0)
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    assert!(hook.set_token("").is_none());
    assert!(hook.refresh().is_none());

    let state = hook.state();
    assert!(!state.loading);
    assert_eq!(state.data, None);
    assert!(!hook.has_token());
}

#[tokio::test]
async fn test_summary_hook_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/summary"))
        .and(header("authorization", "Bearer tok-alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("alice")))
        .expect(1)
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    hook.set_token("tok-alice").unwrap().await.unwrap();

    let state = hook.state();
    let summary = state.data.unwrap();
    assert_eq!(summary.me.username, "alice");
    assert_eq!(summary.followers.len(), 1);
    assert_eq!(summary.likes.posts, vec!["p1", "p2"]);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_summary_hook_error_embeds_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/summary"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    hook.set_token("stale").unwrap().await.unwrap();

    let error = hook.state().error.unwrap();
    assert_eq!(error.status(), Some(401));
    assert!(error.is_unauthorized());
    assert_eq!(error.to_string(), "HTTP 401: token expired");
}

#[tokio::test]
async fn test_summary_hook_refresh_refetches() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("alice")))
        .expect(3)
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    hook.set_token("tok").unwrap().await.unwrap();
    // Same token again is not a change
    assert!(hook.set_token("tok").is_none());

    hook.refresh().unwrap().await.unwrap();
    hook.refresh().unwrap().await.unwrap();
    assert!(hook.state().data.is_some());
}

#[tokio::test]
async fn test_summary_hook_token_change_refetches() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/summary"))
        .and(header("authorization", "Bearer tok-alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("alice")))
        .mount(&server)
        .await;
    Mock::given(path("/api/users/summary"))
        .and(header("authorization", "Bearer tok-bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("bob")))
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    hook.set_token("tok-alice").unwrap().await.unwrap();
    assert_eq!(hook.state().data.unwrap().me.username, "alice");

    hook.set_token("tok-bob").unwrap().await.unwrap();
    assert_eq!(hook.state().data.unwrap().me.username, "bob");
}

#[tokio::test]
async fn test_summary_hook_polling_refreshes() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("alice")))
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    hook.set_token("tok").unwrap().await.unwrap();

    let poller = hook.spawn_polling(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(300)).await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() >= 3, "expected polling, got {}", requests.len());

    drop(hook);
    tokio::time::timeout(Duration::from_secs(2), poller)
        .await
        .expect("poller should stop once the hook is dropped")
        .unwrap();
}

#[tokio::test]
async fn test_summary_hook_logout_clears_previous_user() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("alice")))
        .expect(1)
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    hook.set_token("tok-alice").unwrap().await.unwrap();
    assert_eq!(hook.state().data.unwrap().me.username, "alice");

    assert!(hook.set_token("").is_none());

    let state = hook.state();
    assert!(!hook.has_token());
    assert!(!state.loading);
    assert_eq!(state.data, None);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_summary_hook_logout_discards_in_flight_fetch() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/summary"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(summary_body("alice"))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    let pending = hook.set_token("tok-alice").unwrap();
    assert!(hook.set_token("").is_none());

    pending.await.unwrap();
    assert_eq!(hook.state().data, None);
}

#[tokio::test]
async fn test_summary_hook_refresh_reenters_loading() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/summary"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(summary_body("alice"))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    hook.set_token("tok").unwrap().await.unwrap();
    assert!(!hook.state().loading);

    let handle = hook.refresh().unwrap();
    let state = hook.state();
    assert!(state.loading);
    // Previous data stays visible while the refresh is in flight
    assert!(state.data.is_some());

    handle.await.unwrap();
    assert!(!hook.state().loading);
}

#[tokio::test]
async fn test_summary_hook_latest_token_wins() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/summary"))
        .and(header("authorization", "Bearer tok-alice"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(summary_body("alice"))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(path("/api/users/summary"))
        .and(header("authorization", "Bearer tok-bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("bob")))
        .mount(&server)
        .await;

    let hook = SummaryHook::new(ApiClient::with_base_url(&server.uri()).unwrap());
    let slow = hook.set_token("tok-alice").unwrap();
    let fast = hook.set_token("tok-bob").unwrap();

    fast.await.unwrap();
    assert_eq!(hook.state().data.unwrap().me.username, "bob");

    // Alice's response lands last and must not overwrite Bob's
    slow.await.unwrap();
    let state = hook.state();
    assert_eq!(state.data.unwrap().me.username, "bob");
    assert!(!state.loading);
}

#[tokio::test]
async fn test_summary_hook_transport_failure() {
    let client = ApiClient::with_base_url(&format!("http://{}", closed_addr())).unwrap();
    let hook = SummaryHook::new(client);
    hook.set_token("tok").unwrap().await.unwrap();

    let state = hook.state();
    assert!(!state.loading);
    assert_eq!(state.data, None);
    assert!(matches!(state.error, Some(FetchError::Transport(_))));
}
