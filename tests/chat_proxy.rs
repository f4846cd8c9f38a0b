//! Chat Proxy Tests
//!
//! Runs the proxy against a local stand-in for the upstream completions API.

mod common;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::create_app;
use mechdept::chat::{ChatMessage, ChatProxy, ModelCatalog, ProxyError};
use mechdept::config::ChatConfig;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// What the fake upstream saw.
#[derive(Default)]
struct Recorded {
    models: Vec<String>,
    bodies: Vec<Value>,
    headers: Vec<HeaderMap>,
}

#[derive(Clone)]
struct Upstream {
    /// Models that answer successfully; every other model gets a 429.
    healthy: Arc<Vec<String>>,
    /// Models that answer 200 with a plain-text body.
    garbled: Arc<Vec<String>>,
    recorded: Arc<Mutex<Recorded>>,
}

async fn completions(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let model = body["model"].as_str().unwrap_or_default().to_string();
    {
        let mut recorded = upstream.recorded.lock().unwrap();
        recorded.models.push(model.clone());
        recorded.bodies.push(body.clone());
        recorded.headers.push(headers);
    }

    if upstream.garbled.contains(&model) {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            "upstream hiccup",
        )
            .into_response()
    } else if upstream.healthy.contains(&model) {
        (
            StatusCode::OK,
            Json(json!({
                "model": model,
                "choices": [{ "message": { "role": "assistant", "content": "A lathe turns." } }]
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": { "message": format!("{model} is rate limited") } })),
        )
            .into_response()
    }
}

async fn models() -> Json<Value> {
    Json(json!({
        "data": [
            { "id": "openai/gpt-4o" },
            { "id": "google/gemma-3-12b-it:free" },
            { "id": "meta-llama/llama-3.2-3b-instruct:free" }
        ]
    }))
}

async fn auth_key(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer sk-good") => (StatusCode::OK, Json(json!({ "data": { "label": "test" } }))),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "No auth credentials found" } })),
        ),
    }
}

async fn spawn_upstream(healthy: &[&str]) -> (SocketAddr, Arc<Mutex<Recorded>>) {
    spawn_upstream_with(healthy, &[]).await
}

async fn spawn_upstream_with(
    healthy: &[&str],
    garbled: &[&str],
) -> (SocketAddr, Arc<Mutex<Recorded>>) {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let state = Upstream {
        healthy: Arc::new(healthy.iter().map(|s| s.to_string()).collect()),
        garbled: Arc::new(garbled.iter().map(|s| s.to_string()).collect()),
        recorded: recorded.clone(),
    };

    let app = Router::new()
        .route("/chat/completions", post(completions))
        .route("/models", get(models))
        .route("/auth/key", get(auth_key))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, recorded)
}

fn chat_config(addr: SocketAddr, models: &[&str]) -> ChatConfig {
    ChatConfig {
        api_key: "sk-good".to_string(),
        base_url: format!("http://{addr}"),
        models: models.iter().map(|s| s.to_string()).collect(),
        timeout_secs: 5,
        ..ChatConfig::default()
    }
}

#[tokio::test]
async fn test_first_healthy_model_answers() {
    let (addr, recorded) = spawn_upstream(&["model-b", "model-c"]).await;
    let proxy = ChatProxy::new(&chat_config(addr, &["model-a", "model-b", "model-c"])).unwrap();

    let body = proxy
        .complete(&[ChatMessage::user("What is a lathe?")])
        .await
        .unwrap();

    assert_eq!(body["model"], "model-b");
    assert_eq!(body["choices"][0]["message"]["content"], "A lathe turns.");

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.models, vec!["model-a", "model-b"]);
}

#[tokio::test]
async fn test_all_models_fail_reports_last_error() {
    let (addr, recorded) = spawn_upstream(&[]).await;
    let proxy = ChatProxy::new(&chat_config(addr, &["model-a", "model-b"])).unwrap();

    let err = proxy
        .complete(&[ChatMessage::user("hello")])
        .await
        .unwrap_err();

    match err {
        ProxyError::Unavailable {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 2);
            assert!(last_error.contains("429"));
            assert!(last_error.contains("model-b is rate limited"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(recorded.lock().unwrap().models, vec!["model-a", "model-b"]);
}

#[tokio::test]
async fn test_unreachable_upstream_tries_every_model() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let proxy = ChatProxy::new(&chat_config(addr, &["model-a", "model-b"])).unwrap();

    let err = proxy
        .complete(&[ChatMessage::user("hello")])
        .await
        .unwrap_err();

    match err {
        ProxyError::Unavailable {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 2);
            assert!(last_error.starts_with("request failed"), "{last_error}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_success_falls_through() {
    let (addr, recorded) = spawn_upstream_with(&["model-b"], &["model-a"]).await;
    let proxy = ChatProxy::new(&chat_config(addr, &["model-a", "model-b"])).unwrap();

    let body = proxy
        .complete(&[ChatMessage::user("hello")])
        .await
        .unwrap();

    assert_eq!(body["model"], "model-b");
    assert_eq!(recorded.lock().unwrap().models, vec!["model-a", "model-b"]);
}

#[tokio::test]
async fn test_non_json_success_is_reported_when_last() {
    let (addr, _recorded) = spawn_upstream_with(&[], &["model-a"]).await;
    let proxy = ChatProxy::new(&chat_config(addr, &["model-a"])).unwrap();

    let err = proxy
        .complete(&[ChatMessage::user("hello")])
        .await
        .unwrap_err();

    match err {
        ProxyError::Unavailable { last_error, .. } => {
            assert!(last_error.starts_with("invalid response body"), "{last_error}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_headers_and_system_prompt() {
    let (addr, recorded) = spawn_upstream(&["meta-llama/llama-3.3-70b-instruct:free"]).await;
    let mut config = chat_config(
        addr,
        &["google/gemma-3-12b-it:free", "meta-llama/llama-3.3-70b-instruct:free"],
    );
    config.system_prompt = "Be brief.".to_string();
    let proxy = ChatProxy::new(&config).unwrap();

    proxy
        .complete(&[ChatMessage::user("hello")])
        .await
        .unwrap();

    let recorded = recorded.lock().unwrap();

    let gemma = &recorded.bodies[0]["messages"];
    assert_eq!(gemma.as_array().unwrap().len(), 1);
    assert_eq!(gemma[0]["role"], "user");
    assert_eq!(gemma[0]["content"], "Be brief. hello");

    let llama = &recorded.bodies[1]["messages"];
    assert_eq!(llama[0]["role"], "system");
    assert_eq!(llama[0]["content"], "Be brief.");
    assert_eq!(llama[1]["content"], "hello");

    let headers = &recorded.headers[0];
    assert_eq!(headers["authorization"], "Bearer sk-good");
    assert_eq!(headers["http-referer"], config.referer.as_str());
    assert_eq!(headers["x-title"], config.title.as_str());
}

#[tokio::test]
async fn test_chat_endpoint_returns_upstream_body_verbatim() {
    let (addr, _recorded) = spawn_upstream(&["model-a"]).await;
    let (server, _db) = create_app(chat_config(addr, &["model-a"]), None).await;

    let response = server
        .post("/api/chat")
        .json(&json!({ "messages": [{ "role": "user", "content": "hi" }] }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body.get("data").is_none());
    assert_eq!(body["model"], "model-a");
}

#[tokio::test]
async fn test_chat_endpoint_all_fail_is_503() {
    let (addr, _recorded) = spawn_upstream(&[]).await;
    let (server, _db) = create_app(chat_config(addr, &["model-a"]), None).await;

    let response = server
        .post("/api/chat")
        .json(&json!({ "messages": [{ "role": "user", "content": "hi" }] }))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("model-a is rate limited"));
}

#[tokio::test]
async fn test_chat_endpoint_without_key_never_calls_upstream() {
    let (addr, recorded) = spawn_upstream(&["model-a"]).await;
    let mut config = chat_config(addr, &["model-a"]);
    config.api_key.clear();
    let (server, _db) = create_app(config, None).await;

    let response = server
        .post("/api/chat")
        .json(&json!({ "messages": [{ "role": "user", "content": "hi" }] }))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert!(recorded.lock().unwrap().models.is_empty());
}

#[tokio::test]
async fn test_chat_endpoint_empty_messages() {
    let (addr, recorded) = spawn_upstream(&["model-a"]).await;
    let (server, _db) = create_app(chat_config(addr, &["model-a"]), None).await;

    let response = server
        .post("/api/chat")
        .json(&json!({ "messages": [] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(recorded.lock().unwrap().models.is_empty());
}

#[tokio::test]
async fn test_chat_endpoint_malformed_body() {
    let (addr, recorded) = spawn_upstream(&["model-a"]).await;
    let (server, _db) = create_app(chat_config(addr, &["model-a"]), None).await;

    let response = server
        .post("/api/chat")
        .json(&json!({ "messages": [{ "role": "user" }] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().starts_with("Invalid JSON"));
    assert!(recorded.lock().unwrap().models.is_empty());
}

#[tokio::test]
async fn test_catalog_lists_and_filters_models() {
    let (addr, _recorded) = spawn_upstream(&[]).await;
    let catalog = ModelCatalog::from_config(&chat_config(addr, &["model-a"])).unwrap();

    let ids = catalog.list_models().await.unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(
        mechdept::chat::free_models(&ids),
        vec![
            "google/gemma-3-12b-it:free".to_string(),
            "meta-llama/llama-3.2-3b-instruct:free".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_catalog_verify_key() {
    let (addr, _recorded) = spawn_upstream(&[]).await;

    let good = ModelCatalog::from_config(&chat_config(addr, &["m"])).unwrap();
    let status = good.verify_key().await.unwrap();
    assert!(status.is_valid());
    assert_eq!(status.body["data"]["label"], "test");

    let mut config = chat_config(addr, &["m"]);
    config.api_key = "sk-bad".to_string();
    let bad = ModelCatalog::from_config(&config).unwrap();
    let status = bad.verify_key().await.unwrap();
    assert_eq!(status.status, 401);
    assert!(!status.is_valid());
}
