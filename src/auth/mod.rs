//! Account service.
//!
//! Password hashing, registration and credential checks. Role elevation is
//! gated by a process-wide shared secret.

mod login;
mod password;
mod registration;
mod secret;

pub use login::{login, LoginError, LoginRequest};
pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
};
pub use registration::{register, RegistrationError, RegistrationRequest};
pub use secret::ElevatedSecret;
