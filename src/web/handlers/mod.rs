//! API handlers for Web UI.

pub mod auth;
pub mod chat;
pub mod file;

pub use auth::*;
pub use chat::*;
pub use file::*;

use crate::auth::ElevatedSecret;
use crate::chat::{ChatProxy, ProxyError};
use crate::config::Config;
use crate::db::Database;
use crate::file::DEFAULT_MAX_UPLOAD_SIZE;

/// Application state shared across handlers.
pub struct AppState {
    /// Database pool.
    pub db: Database,
    /// Secret required for the teacher role.
    pub elevated_secret: ElevatedSecret,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
    /// Upstream chat proxy.
    pub chat: ChatProxy,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Database, elevated_secret: ElevatedSecret, chat: ChatProxy) -> Self {
        Self {
            db,
            elevated_secret,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            chat,
        }
    }

    /// Set the maximum upload size.
    pub fn with_max_upload_size(mut self, max_upload_size: u64) -> Self {
        self.max_upload_size = max_upload_size;
        self
    }

    /// Build the state from configuration.
    pub fn from_config(db: Database, config: &Config) -> Result<Self, ProxyError> {
        let chat = ChatProxy::new(&config.chat)?;
        Ok(Self::new(db, ElevatedSecret::new(&config.auth.elevated_secret), chat)
            .with_max_upload_size(config.files.max_upload_size_bytes()))
    }
}
