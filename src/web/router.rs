//! Router configuration for Web API.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    chat, create_folder, delete_item, download_file, list_items, login, register, upload_file,
    AppState,
};
use super::middleware::create_cors_layer;
use crate::db::Database;

/// Room left in the request body for multipart framing on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let upload_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let file_routes = Router::new()
        .route("/list", get(list_items))
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/delete/:id", delete(delete_item))
        .route("/download/:id", get(download_file));

    let folder_routes = Router::new().route("/create", post(create_folder));

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/files", file_routes)
        .nest("/folders", folder_routes)
        .route("/api/chat", post(chat))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router. Reports 503 when the database is unreachable.
pub fn create_health_router(db: Database) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(db)
}

/// Health check handler.
async fn health_check(State(db): State<Database>) -> (StatusCode, &'static str) {
    match db.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_health_router() {
        let db = Database::open_in_memory().await.unwrap();
        let _router = create_health_router(db);
        // Should not panic
    }
}
