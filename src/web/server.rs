//! Web server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::{MechError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// CORS allowed origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(addr: SocketAddr, app_state: AppState, cors_origins: Vec<String>) -> Self {
        Self {
            addr,
            app_state: Arc::new(app_state),
            cors_origins,
        }
    }

    /// Create a web server from configuration.
    pub fn from_config(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.web.host, config.web.port)
            .parse()
            .map_err(|e| MechError::Config(format!("invalid web server address: {e}")))?;

        Ok(Self::new(addr, app_state, config.web.cors_origins.clone()))
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn into_router(self) -> Router {
        let db = self.app_state.db.clone();
        create_router(self.app_state, &self.cors_origins).merge(create_health_router(db))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let addr = self.addr;
        let router = self.into_router();

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let addr = self.addr;
        let router = self.into_router();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ElevatedSecret;
    use crate::chat::ChatProxy;
    use crate::config::ChatConfig;
    use crate::Database;

    async fn create_state() -> AppState {
        let db = Database::open_in_memory().await.unwrap();
        let chat = ChatProxy::new(&ChatConfig::default()).unwrap();
        AppState::new(db, ElevatedSecret::default(), chat)
    }

    #[tokio::test]
    async fn test_web_server_from_config() {
        let mut config = Config::default();
        config.web.port = 0;

        let server = WebServer::from_config(&config, create_state().await).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_invalid_host() {
        let mut config = Config::default();
        config.web.host = "not an address".to_string();

        let result = WebServer::from_config(&config, create_state().await);
        assert!(matches!(result, Err(MechError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = WebServer::new(addr, create_state().await, vec![]);
        let addr = server.run_with_addr().await.unwrap();

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");
    }
}
