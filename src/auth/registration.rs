//! User registration.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{hash_password, ElevatedSecret, PasswordError};
use crate::db::{NewUser, Role, User, UserRepository};
use crate::MechError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Email already registered.
    #[error("email already registered")]
    EmailExists,

    /// Teacher registration without the matching secret.
    #[error("invalid teacher secret code")]
    ElevatedSecretMismatch,

    /// Password rejected or hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Display name.
    pub name: String,
    /// Email address (login key).
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Requested role.
    pub role: Role,
    /// Secret presented for the teacher role.
    pub secret: Option<String>,
}

impl RegistrationRequest {
    /// Create a student registration request.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: Role::Student,
            secret: None,
        }
    }

    /// Request the teacher role, presenting the given secret.
    pub fn as_teacher(mut self, secret: Option<impl Into<String>>) -> Self {
        self.role = Role::Teacher;
        self.secret = secret.map(Into::into);
        self
    }
}

/// Register a new user.
///
/// Checks, in order:
/// 1. the email is not already registered
/// 2. a teacher request carries the shared secret
///
/// then hashes the password and inserts the row.
pub async fn register(
    repo: &UserRepository<'_>,
    elevated_secret: &ElevatedSecret,
    request: RegistrationRequest,
) -> Result<User, RegistrationError> {
    if repo
        .email_exists(&request.email)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
    {
        info!(email = %request.email, "Registration rejected: email already registered");
        return Err(RegistrationError::EmailExists);
    }

    if request.role.is_elevated() && !elevated_secret.matches(request.secret.as_deref()) {
        warn!(email = %request.email, "Teacher registration rejected: secret mismatch");
        return Err(RegistrationError::ElevatedSecretMismatch);
    }

    let password_hash = hash_password(&request.password)?;

    let new_user =
        NewUser::new(&request.name, &request.email, password_hash).with_role(request.role);

    let user = repo.create(&new_user).await.map_err(|e| match e {
        MechError::Conflict(_) => RegistrationError::EmailExists,
        e => RegistrationError::Database(e.to_string()),
    })?;

    info!(
        email = %user.email,
        user_id = user.id,
        role = %user.role,
        "New user registered"
    );

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::Database;

    const SECRET: &str = "workshop-secret";

    async fn setup() -> (Database, ElevatedSecret) {
        let db = Database::open_in_memory().await.unwrap();
        (db, ElevatedSecret::new(SECRET))
    }

    #[tokio::test]
    async fn test_register_student() {
        let (db, secret) = setup().await;
        let repo = UserRepository::new(db.pool());

        let user = register(
            &repo,
            &secret,
            RegistrationRequest::new("Ravi", "ravi@example.com", "pw-123"),
        )
        .await
        .unwrap();

        assert_eq!(user.name, "Ravi");
        assert_eq!(user.role, Role::Student);
        assert_ne!(user.password_hash, "pw-123");
        assert!(verify_password("pw-123", &user.password_hash).is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (db, secret) = setup().await;
        let repo = UserRepository::new(db.pool());

        register(
            &repo,
            &secret,
            RegistrationRequest::new("First", "dup@example.com", "pw-1"),
        )
        .await
        .unwrap();

        let result = register(
            &repo,
            &secret,
            RegistrationRequest::new("Second", "dup@example.com", "pw-2"),
        )
        .await;

        assert!(matches!(result, Err(RegistrationError::EmailExists)));
        let first = repo.get_by_email("dup@example.com").await.unwrap().unwrap();
        assert_eq!(first.name, "First");
        assert!(verify_password("pw-1", &first.password_hash).is_ok());
    }

    #[tokio::test]
    async fn test_register_teacher_requires_secret() {
        let (db, secret) = setup().await;
        let repo = UserRepository::new(db.pool());

        let wrong = register(
            &repo,
            &secret,
            RegistrationRequest::new("T", "t@example.com", "pw").as_teacher(Some("nope")),
        )
        .await;
        assert!(matches!(wrong, Err(RegistrationError::ElevatedSecretMismatch)));

        let missing = register(
            &repo,
            &secret,
            RegistrationRequest::new("T", "t@example.com", "pw").as_teacher(None::<String>),
        )
        .await;
        assert!(matches!(
            missing,
            Err(RegistrationError::ElevatedSecretMismatch)
        ));
        assert_eq!(repo.count().await.unwrap(), 0);

        let user = register(
            &repo,
            &secret,
            RegistrationRequest::new("T", "t@example.com", "pw").as_teacher(Some(SECRET)),
        )
        .await
        .unwrap();
        assert_eq!(user.role, Role::Teacher);
    }

    #[tokio::test]
    async fn test_register_teacher_refused_without_configured_secret() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        let result = register(
            &repo,
            &ElevatedSecret::default(),
            RegistrationRequest::new("T", "t@example.com", "pw").as_teacher(Some("")),
        )
        .await;

        assert!(matches!(result, Err(RegistrationError::ElevatedSecretMismatch)));
    }

    #[tokio::test]
    async fn test_student_ignores_secret() {
        let (db, secret) = setup().await;
        let repo = UserRepository::new(db.pool());

        let mut request = RegistrationRequest::new("S", "s@example.com", "pw");
        request.secret = Some("garbage".to_string());

        let user = register(&repo, &secret, request).await.unwrap();
        assert_eq!(user.role, Role::Student);
    }

    #[tokio::test]
    async fn test_register_empty_password() {
        let (db, secret) = setup().await;
        let repo = UserRepository::new(db.pool());

        let result = register(
            &repo,
            &secret,
            RegistrationRequest::new("S", "s@example.com", ""),
        )
        .await;

        assert!(matches!(
            result,
            Err(RegistrationError::Password(PasswordError::Empty))
        ));
    }
}
