//! Chat proxy handler.

use axum::{extract::State, Json};
use serde_json::Value;
use std::sync::Arc;

use crate::web::dto::{ChatRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/chat - Forward a conversation upstream.
///
/// The upstream body is returned as-is.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    let body = state.chat.complete(&req.messages).await?;
    Ok(Json(body))
}
