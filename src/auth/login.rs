//! Credential check for login.
//!
//! No session is created; every call re-checks credentials.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{verify_password, ElevatedSecret, PasswordError};
use crate::db::{User, UserRepository};

/// Login errors.
#[derive(Error, Debug)]
pub enum LoginError {
    /// Unknown email or wrong password. The two are deliberately not
    /// distinguished.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Teacher login without the matching secret.
    #[error("invalid teacher secret code")]
    ElevatedSecretMismatch,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Login request data.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Secret presented for the teacher role.
    pub secret: Option<String>,
}

impl LoginRequest {
    /// Create a login request without a secret.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            secret: None,
        }
    }

    /// Attach the teacher secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}

/// Authenticate a user.
///
/// The teacher secret is evaluated only after the password has been verified,
/// so a wrong password always reports [`LoginError::InvalidCredentials`].
pub async fn login(
    repo: &UserRepository<'_>,
    elevated_secret: &ElevatedSecret,
    request: &LoginRequest,
) -> Result<User, LoginError> {
    let Some(user) = repo
        .get_by_email(&request.email)
        .await
        .map_err(|e| LoginError::Database(e.to_string()))?
    else {
        debug!(email = %request.email, "Login failed: unknown email");
        return Err(LoginError::InvalidCredentials);
    };

    match verify_password(&request.password, &user.password_hash) {
        Ok(()) => {}
        Err(PasswordError::InvalidHash) => {
            warn!(user_id = user.id, "Login failed: stored password hash is malformed");
            return Err(LoginError::InvalidCredentials);
        }
        Err(_) => {
            debug!(user_id = user.id, "Login failed: wrong password");
            return Err(LoginError::InvalidCredentials);
        }
    }

    if user.role.is_elevated() && !elevated_secret.matches(request.secret.as_deref()) {
        warn!(user_id = user.id, "Teacher login rejected: secret mismatch");
        return Err(LoginError::ElevatedSecretMismatch);
    }

    info!(user_id = user.id, role = %user.role, "User logged in");
    Ok(user)
}
