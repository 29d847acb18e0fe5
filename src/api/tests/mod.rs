use super::*;
use crate::publish::MemoryStore;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test FileRelay wrapped in Arc, plus its store
async fn create_test_relay() -> (Arc<FileRelay>, Arc<MemoryStore>, tempfile::TempDir) {
    let (relay, store, temp_dir) = crate::relay::test_helpers::create_test_relay().await;
    (Arc::new(relay), store, temp_dir)
}

/// Router over a fresh relay with its own config, optionally adjusted
async fn test_router(
    configure: impl FnOnce(&mut Config),
) -> (Router, Arc<FileRelay>, Arc<MemoryStore>, tempfile::TempDir) {
    let (relay, store, temp_dir) = create_test_relay().await;
    let mut config = (*relay.get_config()).clone();
    configure(&mut config);
    let app = create_router(relay.clone(), Arc::new(config));
    (app, relay, store, temp_dir)
}

/// Serve `app` on a real listener and return its address
async fn serve_router(app: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns_and_stops() {
    let (relay, _store, _temp_dir) = create_test_relay().await;

    let mut config = (*relay.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(start_api_server_with_shutdown(relay, config, async {
        stop_rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok(), "server returned {result:?}");
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _relay, _store, _temp_dir) = test_router(|config| {
        config.server.api.cors_enabled = true;
        config.server.api.cors_origins = vec!["*".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (app, _relay, _store, _temp_dir) = test_router(|config| {
        config.server.api.cors_enabled = true;
        config.server.api.cors_origins = vec!["http://allowed.example".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://allowed.example")
    );

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://other.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "unlisted origin should not be allowed"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (app, _relay, _store, _temp_dir) = test_router(|config| {
        config.server.api.cors_enabled = false;
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should not be present when CORS is disabled"
    );
}

#[tokio::test]
async fn test_api_key_guards_routes_except_health() {
    let (app, _relay, _store, _temp_dir) = test_router(|config| {
        config.server.api.api_key = Some("relay-secret".to_string());
    })
    .await;

    let request = Request::builder().uri("/files").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");
    assert_eq!(json["error"]["message"], "Missing X-Api-Key header");

    let request = Request::builder()
        .uri("/files")
        .header("X-Api-Key", "wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "health stays open without a key");

    let request = Request::builder()
        .uri("/files")
        .header("X-Api-Key", "relay-secret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_swagger_ui_enabled() {
    let (app, _relay, _store, _temp_dir) = test_router(|config| {
        config.server.api.swagger_ui = true;
    })
    .await;

    let request = Request::builder()
        .uri(SWAGGER_SPEC_PATH)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/files"].is_object());
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let (app, _relay, _store, _temp_dir) = test_router(|config| {
        config.server.api.swagger_ui = false;
    })
    .await;

    let request = Request::builder()
        .uri(SWAGGER_SPEC_PATH)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_build_cors_layer_accepts_empty_list() {
    // Empty list means any origin; must not panic
    let _ = build_cors_layer(&[]);
    let _ = build_cors_layer(&["not a header value\n".to_string()]);
}
