//! Upstream search API client.

use crate::error::UpstreamError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Query parameters for one upstream search, credential included.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    params: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn new(api_key: &str, engine: &str) -> Self {
        Self {
            params: vec![
                ("api_key".to_string(), api_key.to_string()),
                ("engine".to_string(), engine.to_string()),
            ],
        }
    }

    /// Set `key`, replacing any existing value.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

impl fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in &self.params {
            if k == "api_key" {
                map.entry(k, &"<redacted>");
            } else {
                map.entry(k, v);
            }
        }
        map.finish()
    }
}

/// Performs the remote search call.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Return the upstream JSON document, or the failure that prevented it.
    async fn search(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError>;
}

/// `SearchClient` backed by the SerpApi HTTP endpoint.
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SerpApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("serpgate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/search.json", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchClient for SerpApiClient {
    async fn search(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let engine = request.get("engine").unwrap_or_default().to_string();

        let response = self
            .http
            .get(&self.endpoint)
            .query(request.params())
            .query(&[("output", "json")])
            .send()
            .await
            .map_err(|e| UpstreamError::wrap(format!("Search request to engine '{}' failed", engine), e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            tracing::debug!(engine = %engine, status = status.as_u16(), "Upstream search returned an error status");
            return Err(UpstreamError::wrap(
                format!("Search request to engine '{}' failed", engine),
                UpstreamError::status(status.as_u16(), body),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Decode {
                message: format!("Engine '{}' returned a malformed document", engine),
                cause: Some(Box::new(e.into())),
            })
    }
}
