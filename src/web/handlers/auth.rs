//! Account handlers for Web API.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::{self, RegistrationRequest};
use crate::db::UserRepository;
use crate::web::dto::{LoginRequest, RegisterRequest, UserSummary, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /auth/register - Create an account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    let request = RegistrationRequest {
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        password: req.password,
        role: req.role,
        secret: req.master_code,
    };

    let repo = UserRepository::new(state.db.pool());
    let user = auth::register(&repo, &state.elevated_secret, request).await?;

    Ok(Json(UserSummary::from(&user)))
}

/// POST /auth/login - Check credentials.
///
/// Nothing is issued on success; the caller gets the account summary.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    let request = auth::LoginRequest {
        email: req.email.trim().to_string(),
        password: req.password,
        secret: req.master_code,
    };

    let repo = UserRepository::new(state.db.pool());
    let user = auth::login(&repo, &state.elevated_secret, &request).await?;

    Ok(Json(UserSummary::from(&user)))
}
