//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use serpgate::{build_app, AppState, Config, EngineCatalog, SearchClient, UpstreamError, UpstreamRequest};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

type Responder = dyn Fn(&UpstreamRequest) -> Result<Value, UpstreamError> + Send + Sync;

/// In-process `SearchClient` that records every upstream request.
pub struct RecordingClient {
    respond: Box<Responder>,
    delay: Duration,
    pub requests: Mutex<Vec<UpstreamRequest>>,
}

impl RecordingClient {
    pub fn new(respond: impl Fn(&UpstreamRequest) -> Result<Value, UpstreamError> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client answering with `sample_document`, echoing the credential it saw.
    pub fn echoing() -> Self {
        Self::new(|request| Ok(sample_document(request.get("api_key").unwrap_or_default())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<UpstreamRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SearchClient for RecordingClient {
    async fn search(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.respond)(request)
    }
}

pub fn sample_document(echo_key: &str) -> Value {
    json!({
        "search_metadata": { "id": "search-1", "status": "Success" },
        "search_parameters": { "q": "coffee", "engine": "google_light" },
        "search_information": { "total_results": 2 },
        "echo_key": echo_key,
        "organic_results": [
            { "position": 1, "title": "Café Zürich", "link": "https://example.com/cafe" }
        ],
        "pagination": { "next": "https://example.com/next" },
        "serpapi_pagination": { "next": "https://serpapi.com/next" }
    })
}

/// Write descriptor files (including ones the loader must skip) into `dir`.
pub fn write_engines(dir: &Path) {
    let google = json!({
        "engine": "google_light",
        "params": {
            "q": { "type": "text", "required": true, "group": "search_query", "description": "Search query." },
            "hl": { "type": "select", "options": ["en", "fr"], "group": "localization" }
        },
        "common_params": {
            "no_cache": { "type": "checkbox", "group": "serpapi_parameters" }
        }
    });
    let bing = json!({ "engine": "bing", "params": {}, "common_params": {} });
    let bad = json!({ "engine": "google-news", "params": {}, "common_params": {} });

    std::fs::write(dir.join("google_light.json"), google.to_string()).unwrap();
    std::fs::write(dir.join("bing.json"), bing.to_string()).unwrap();
    std::fs::write(dir.join("google-news.json"), bad.to_string()).unwrap();
}

/// Build the full gateway over a temporary catalog and the given client.
pub fn create_test_app(client: Arc<RecordingClient>) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    write_engines(dir.path());

    let config = Config {
        engines_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let catalog = EngineCatalog::load(&config.engines_dir).unwrap();
    let state = Arc::new(AppState::new(config, catalog, client));
    (build_app(state), dir)
}

/// Send a request and return status plus raw body text.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

/// Send a request and decode the body as JSON (`{}` when it is not JSON).
pub async fn json_request(
    app: Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, text) = send(app, method, uri, bearer, body).await;
    (status, serde_json::from_str(&text).unwrap_or(json!({})))
}

/// JSON-RPC `tools/call` envelope for the search tool.
pub fn search_call(arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": "search", "arguments": arguments }
    })
}
