//! Mechanical Department backend.
//!
//! Account registration and login with a secret-gated teacher role, a
//! folder/file store kept in SQLite, and a chat proxy that falls back across
//! upstream models.

pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{
    hash_password, login, register, validate_password, verify_password, ElevatedSecret,
    LoginError, LoginRequest, PasswordError, RegistrationError, RegistrationRequest,
};
pub use chat::{ChatMessage, ChatProxy, ProxyError};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository};
pub use error::{MechError, Result};
pub use file::{FileService, ItemRepository, StoredItem, UploadRequest};
