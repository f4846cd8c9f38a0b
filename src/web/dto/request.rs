//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::non_blank_text;
use crate::chat::ChatMessage;
use crate::db::Role;

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name.
    #[validate(
        length(max = 100, message = "Must be at most 100 characters"),
        custom(function = "non_blank_text")
    )]
    pub name: String,
    /// Email address.
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, max = 128, message = "Must be between 1 and 128 characters"))]
    pub password: String,
    /// Requested role.
    #[serde(default)]
    pub role: Role,
    /// Shared secret for the teacher role.
    #[serde(default)]
    pub master_code: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub password: String,
    /// Shared secret for the teacher role.
    #[serde(default)]
    pub master_code: Option<String>,
}

/// Folder creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(
        length(max = 255, message = "Must be at most 255 characters"),
        custom(function = "non_blank_text")
    )]
    pub name: String,
    /// Containing folder, absent for the root.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Query parameters for listing a folder.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Folder to list, absent for the root.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Chat completion request.
///
/// An empty `messages` list passes here and is rejected by the proxy with 400.
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
}
