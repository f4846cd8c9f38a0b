//! Shared helpers for the HTTP API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use mechdept::auth::ElevatedSecret;
use mechdept::chat::ChatProxy;
use mechdept::config::ChatConfig;
use mechdept::web::{create_health_router, create_router, AppState};
use mechdept::Database;

/// Teacher secret used by every test server.
pub const TEST_SECRET: &str = "test-teacher-secret";

/// Build the full application over an in-memory database.
pub async fn create_app(chat: ChatConfig, max_upload_size: Option<u64>) -> (TestServer, Database) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let proxy = ChatProxy::new(&chat).expect("Failed to create chat proxy");
    let mut state = AppState::new(db.clone(), ElevatedSecret::new(TEST_SECRET), proxy);
    if let Some(max) = max_upload_size {
        state = state.with_max_upload_size(max);
    }

    let router = create_router(Arc::new(state), &[]).merge(create_health_router(db.clone()));
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, db)
}

/// Test server with default settings and no chat API key.
pub async fn create_test_server() -> (TestServer, Database) {
    create_app(ChatConfig::default(), None).await
}

/// Register a student and return the response body.
pub async fn register_student(server: &TestServer, name: &str, email: &str, password: &str) -> Value {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "name": name,
            "email": email,
            "password": password,
            "role": "student"
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

/// Register a teacher with the correct secret and return the response body.
pub async fn register_teacher(server: &TestServer, name: &str, email: &str, password: &str) -> Value {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "name": name,
            "email": email,
            "password": password,
            "role": "teacher",
            "master_code": TEST_SECRET
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}
