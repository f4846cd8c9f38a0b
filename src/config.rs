//! Configuration module for the backend.

use serde::Deserialize;
use std::path::Path;

use crate::{MechError, Result};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the HTTP API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_web_host() -> String {
    "127.0.0.1".to_string()
}

fn default_web_port() -> u16 {
    8000
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection string.
    #[serde(default = "default_db_url")]
    pub url: String,
}

fn default_db_url() -> String {
    "sqlite://data/mechdept.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
        }
    }
}

/// File library configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_max_upload_size() -> u64 {
    10
}

impl FilesConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Account configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Shared secret required to register or log in as a teacher.
    ///
    /// When empty, teacher registration and login are always refused.
    #[serde(default)]
    pub elevated_secret: String,
}

/// Chat proxy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Upstream API key.
    #[serde(default)]
    pub api_key: String,
    /// Upstream API base URL.
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,
    /// Candidate models, in priority order.
    #[serde(default = "default_chat_models")]
    pub models: Vec<String>,
    /// Per-candidate request timeout in seconds.
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
    /// System prompt added to every conversation. Empty disables it.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Value of the HTTP-Referer header sent upstream.
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Value of the X-Title header sent upstream.
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_chat_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_chat_models() -> Vec<String> {
    [
        "google/gemma-3-12b-it:free",
        "meta-llama/llama-3.3-70b-instruct:free",
        "meta-llama/llama-3.2-3b-instruct:free",
        "mistralai/mistral-small-3.1-24b-instruct:free",
        "qwen/qwen-2.5-vl-7b-instruct:free",
        "nvidia/nemotron-3-nano-30b-a3b:free",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_chat_timeout() -> u64 {
    30
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_referer() -> String {
    "http://localhost:5173".to_string()
}

fn default_title() -> String {
    "Mech Chatbot".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_chat_base_url(),
            models: default_chat_models(),
            timeout_secs: default_chat_timeout(),
            system_prompt: default_system_prompt(),
            referer: default_referer(),
            title: default_title(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/mechdept.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web server configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// File library configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Account configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Chat proxy configuration.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(MechError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| MechError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DATABASE_URL`: database connection string
    /// - `OPENROUTER_API_KEY`: upstream chat API key (quotes and whitespace stripped)
    /// - `ELEVATED_SECRET`: teacher registration/login secret
    /// - `MECHDEPT_PORT`: web server port
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using the given variable lookup.
    ///
    /// Empty values never override.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = normalize_database_url(&url);
        }
        if let Some(key) = var("OPENROUTER_API_KEY") {
            self.chat.api_key = sanitize_api_key(&key);
        }
        if let Some(secret) = var("ELEVATED_SECRET") {
            self.auth.elevated_secret = secret;
        }
        if let Some(port) = var("MECHDEPT_PORT") {
            match port.trim().parse() {
                Ok(port) => self.web.port = port,
                Err(e) => tracing::warn!("Invalid MECHDEPT_PORT value {port:?}: {e}"),
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - no chat candidate models are configured
    /// - the chat timeout is zero
    /// - the chat base URL is not an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        if self.chat.models.is_empty() {
            return Err(MechError::Config(
                "chat.models must list at least one candidate model".to_string(),
            ));
        }
        if self.chat.timeout_secs == 0 {
            return Err(MechError::Config(
                "chat.timeout_secs must be greater than zero".to_string(),
            ));
        }
        let base_url = url::Url::parse(&self.chat.base_url)
            .map_err(|e| MechError::Config(format!("chat.base_url is invalid: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(MechError::Config(format!(
                "chat.base_url must use http or https, got {}",
                base_url.scheme()
            )));
        }
        Ok(())
    }
}

/// Strip surrounding whitespace and any quote characters from an API key.
///
/// Keys pasted into `.env` files frequently arrive wrapped in quotes or with a
/// trailing newline, which the upstream rejects.
pub fn sanitize_api_key(raw: &str) -> String {
    raw.trim().replace(['"', '\''], "")
}

/// Treat a bare file path as a SQLite database location.
fn normalize_database_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") || url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite://{url}")
    }
}
