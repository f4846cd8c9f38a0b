//! Upstream model catalog and key inspection.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ChatConfig;
use crate::{MechError, Result};

/// Marker in model identifiers for the no-cost tier.
const FREE_SUFFIX: &str = ":free";

/// Result of a key check: the upstream status and its response body.
#[derive(Debug, Clone)]
pub struct KeyStatus {
    /// HTTP status returned by the upstream.
    pub status: u16,
    /// Response body, `Value::Null` if it was not JSON.
    pub body: Value,
}

impl KeyStatus {
    /// Whether the upstream accepted the key.
    pub fn is_valid(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

/// Client for the upstream catalog endpoints.
pub struct ModelCatalog {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ModelCatalog {
    /// Create a catalog client.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MechError::Upstream(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Create a catalog client from the chat configuration.
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            &config.api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Ask the upstream to describe the configured key.
    ///
    /// A rejected key is reported through [`KeyStatus::status`], not as an
    /// error; only transport failures are errors.
    pub async fn verify_key(&self) -> Result<KeyStatus> {
        let response = self
            .client
            .get(format!("{}/auth/key", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| MechError::Upstream(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        Ok(KeyStatus { status, body })
    }

    /// List every model identifier the upstream offers, in upstream order.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let mut request = self.client.get(format!("{}/models", self.base_url));
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MechError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MechError::Upstream(format!(
                "model list request returned HTTP {}",
                status.as_u16()
            )));
        }

        let list = response
            .json::<ModelList>()
            .await
            .map_err(|e| MechError::Upstream(format!("invalid model list: {e}")))?;

        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

/// Model identifiers on the free tier, sorted.
pub fn free_models(ids: &[String]) -> Vec<String> {
    let mut free: Vec<String> = ids
        .iter()
        .filter(|id| id.contains(FREE_SUFFIX))
        .cloned()
        .collect();
    free.sort();
    free
}

/// Model identifiers containing `needle`, ignoring case, in input order.
pub fn models_matching(ids: &[String], needle: &str) -> Vec<String> {
    let needle = needle.to_lowercase();
    ids.iter()
        .filter(|id| id.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
