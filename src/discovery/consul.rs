//! Consul key/value state store

use super::{StateKey, StateStore};
use crate::error::{FlowError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;

/// State store backed by the Consul KV HTTP API
pub struct ConsulStore {
    /// Consul address, e.g. `http://consul.example.com:8500`
    address: String,
    /// HTTP client
    client: reqwest::Client,
}

impl ConsulStore {
    /// Create a new Consul client. Addresses without a scheme get `http://`.
    pub fn new(address: &str) -> Self {
        Self {
            address: with_scheme(address.trim_end_matches('/')),
            client: reqwest::Client::new(),
        }
    }

    fn key_url(&self, service_name: &str, key: StateKey) -> String {
        format!("{}/v1/kv/{}", self.address, key.path(service_name))
    }
}

#[async_trait]
impl StateStore for ConsulStore {
    async fn get(&self, service_name: &str, key: StateKey) -> Result<Option<String>> {
        let url = format!("{}?raw", self.key_url(service_name, key));
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| FlowError::StateStore {
            url: url.clone(),
            reason: format!("please make sure that the Consul address is correct: {}", e),
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FlowError::StateStore {
                url,
                reason: format!("unexpected status {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| FlowError::StateStore {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if body.is_empty() {
            Ok(None)
        } else {
            Ok(Some(body))
        }
    }

    async fn put(&self, service_name: &str, key: StateKey, value: &str) -> Result<()> {
        let url = self.key_url(service_name, key);
        tracing::debug!("PUT {} <- {}", url, value);

        let response = self
            .client
            .put(&url)
            .body(value.to_string())
            .send()
            .await
            .map_err(|e| FlowError::StateStore {
                url: url.clone(),
                reason: format!("could not store {} information: {}", key, e),
            })?;

        if !response.status().is_success() {
            return Err(FlowError::StateStore {
                url,
                reason: format!("unexpected status {}", response.status()),
            });
        }
        Ok(())
    }
}

/// Prefix `http://` unless the address already names a scheme
pub(crate) fn with_scheme(address: &str) -> String {
    if address.to_lowercase().starts_with("http") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}
