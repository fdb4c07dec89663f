use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::Service;

use localized_errors::api::handlers::{AppState, AppStateInner};
use localized_errors::api::routes::{create_router, with_error_handling};
use localized_errors::config::{Config, ErrorConfig, LocalizationConfig, ServerConfig};
use localized_errors::errors::{AppError, ResponseContext};
use localized_errors::localization::Catalog;

fn test_state(details: bool) -> AppState {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            instance_id: "test-instance".to_string(),
        },
        errors: ErrorConfig { details },
        localization: LocalizationConfig::default(),
    };

    let catalog = Catalog::builtin().expect("Failed to load built-in catalogs");
    Arc::new(AppStateInner::new(&config, Arc::new(catalog)))
}

// Helper to create test app
fn create_test_app() -> Router {
    create_router(test_state(false))
}

// Helper to send request and parse JSON response
async fn send_json_request(app: &mut Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let (status, _, json) = send_request(app, method, uri, None).await;
    (status, json)
}

async fn send_request(
    app: &mut Router,
    method: &str,
    uri: &str,
    request_id: Option<&str>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(request_id) = request_id {
        builder = builder.header("x-request-id", request_id);
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.call(request).await.unwrap();
    let status = response.status();
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));

    (status, header, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let mut app = create_test_app();
    let (status, body) = send_json_request(&mut app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "localized-errors");
    assert_eq!(body["instance_id"], "test-instance");
    assert_eq!(body["error_details"], false);
}

#[tokio::test]
async fn test_error_with_status_prefix() {
    let mut app = create_test_app();
    let (status, header, body) =
        send_request(&mut app, "GET", "/errors/NOT_FOUND?arg=user:42", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["status"], 404);
    assert_eq!(body["error"]["message"], "Resource user:42 not found");
    assert_eq!(body["content"]["method"], "GET");
    assert_eq!(body["content"]["path"], "/errors/NOT_FOUND");
    assert_eq!(body["content"]["route"], "/errors/:key");

    // the body and the header carry the same request id
    let header = header.expect("x-request-id header");
    assert_eq!(body["error"]["request_id"], header.as_str());
}

#[tokio::test]
async fn test_error_without_status_prefix_defaults_to_503() {
    let mut app = create_test_app();
    let (status, body) = send_json_request(&mut app, "GET", "/errors/TIMEOUT").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["status"], 503);
    assert_eq!(body["error"]["message"], "Request timed out");
}

#[tokio::test]
async fn test_multiple_args_and_missing_args() {
    let mut app = create_test_app();

    let (status, body) =
        send_json_request(&mut app, "GET", "/errors/FORBIDDEN?arg=%2Fadmin").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "You are not allowed to access /admin");

    // missing arguments render as empty text
    let (status, body) = send_json_request(&mut app, "GET", "/errors/CONFLICT").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Resource  already exists");
}

#[tokio::test]
async fn test_localized_error() {
    let mut app = create_test_app();
    let (status, body) =
        send_json_request(&mut app, "GET", "/errors/NOT_FOUND?arg=user:42&locale=tr-TR").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "user:42 kaynağı bulunamadı");
}

#[tokio::test]
async fn test_unknown_key_goes_to_fallback_handler() {
    let mut app = create_test_app();
    let (status, body) = send_json_request(&mut app, "GET", "/errors/NO_SUCH_KEY").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["status"], 500);
    assert_eq!(body["error"]["message"], "An unexpected error occurred");
    assert!(!body.to_string().contains("NO_SUCH_KEY"));
}

#[tokio::test]
async fn test_detached_error_renders_substitute() {
    let mut app = create_test_app();
    let (status, body) =
        send_json_request(&mut app, "GET", "/errors/NOT_FOUND/detached?arg=user:42").await;

    // the substitute's status, not NOT_FOUND's 404
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["status"], 500);
    assert_eq!(
        body["error"]["message"],
        "No response context was provided while handling NOT_FOUND"
    );
    assert_eq!(body["content"]["path"], "/errors/NOT_FOUND/detached");
    assert_eq!(body["content"]["route"], "/errors/:key/detached");
}

#[tokio::test]
async fn test_undecodable_key_is_a_structured_bad_request() {
    let mut app = create_test_app();

    for uri in ["/errors/%FF", "/errors/%FF/detached"] {
        let (status, header, body) = send_request(&mut app, "GET", uri, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert_eq!(body["error"]["status"], 400, "{uri}");
        let message = body["error"]["message"].as_str().expect("JSON error message");
        assert!(message.starts_with("Invalid request: "), "{uri}: {message}");
        assert_eq!(body["error"]["request_id"], header.expect("x-request-id").as_str());
        assert_eq!(body["content"]["method"], "GET", "{uri}");
    }
}

#[tokio::test]
async fn test_unmatched_route() {
    let mut app = create_test_app();
    let (status, body) = send_json_request(&mut app, "GET", "/no/such/route").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "No route matches /no/such/route");
    assert_eq!(body["content"]["path"], "/no/such/route");
}

#[tokio::test]
async fn test_incoming_request_id_is_reused() {
    let mut app = create_test_app();
    let (status, header, body) =
        send_request(&mut app, "GET", "/errors/TIMEOUT", Some("trace-abc")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(header.as_deref(), Some("trace-abc"));
    assert_eq!(body["error"]["request_id"], "trace-abc");
}

#[tokio::test]
async fn test_error_details_never_reach_client() {
    let mut app = create_router(test_state(true));
    let (status, body) = send_json_request(&mut app, "GET", "/errors/NOT_FOUND?arg=x").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let text = body.to_string();
    assert!(!text.contains("errDetails"));
    assert!(!text.contains("Stack"));

    let (_, health) = send_json_request(&mut app, "GET", "/health").await;
    assert_eq!(health["error_details"], true);
}

async fn panicking_handler() -> &'static str {
    panic!("state corrupted")
}

async fn failing_handler() -> Result<&'static str, AppError> {
    Err(anyhow::anyhow!("database offline").into())
}

fn recording_state() -> (AppState, Arc<Mutex<Vec<String>>>) {
    let state = test_state(false);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    state
        .errors
        .registry()
        .register(Arc::new(move |err: &anyhow::Error, tag: &str| {
            sink.lock().unwrap().push(format!("{tag}: {err}"));
            ResponseContext::new()
                .with_status(StatusCode::BAD_GATEWAY)
                .with_message("custom fallback")
                .emit()
        }));
    (state, seen)
}

#[tokio::test]
async fn test_unhandled_error_uses_registered_fallback() {
    let (state, seen) = recording_state();
    let routes = Router::new().route("/broken", get(failing_handler));
    let mut app = with_error_handling(routes, state);

    let (status, body) = send_json_request(&mut app, "GET", "/broken").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["message"], "custom fallback");
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["dispatch_uncaught: database offline".to_string()]
    );
}

#[tokio::test]
async fn test_panic_reaches_fallback_handler() {
    let (state, seen) = recording_state();
    let routes = Router::new().route("/panic", get(panicking_handler));
    let mut app = with_error_handling(routes, state);

    let (status, _) = send_json_request(&mut app, "GET", "/panic").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("dispatch_uncaught: handler panicked"));
    assert!(seen[0].contains("state corrupted"));
}

#[tokio::test]
async fn test_structured_errors_do_not_reach_fallback() {
    let (state, seen) = recording_state();
    let mut app = create_router(state);

    let (status, _) = send_json_request(&mut app, "GET", "/errors/NOT_FOUND?arg=x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_json_request(&mut app, "GET", "/errors/TIMEOUT/detached").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let mut app = create_test_app();
    send_json_request(&mut app, "GET", "/errors/TIMEOUT").await;

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("structured_errors_rendered_total"));
    assert!(text.contains("http_requests_total"));
}
