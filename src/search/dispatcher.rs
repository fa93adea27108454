//! The `search` tool: argument validation, upstream call and result shaping.
//!
//! Business failures never surface as HTTP errors. Every outcome, including
//! validation and upstream failures, is a text result with an error flag, as
//! the tool-call protocol expects.

use crate::auth::RequestContext;
use crate::search::client::{SearchClient, UpstreamRequest};
use crate::search::normalize::{http_status, normalize_error};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Engine used when the caller does not name one.
pub const DEFAULT_ENGINE: &str = "google_light";

pub const DEFAULT_NUM: u32 = 10;

/// Top-level fields removed from the upstream document in compact mode.
pub const COMPACT_STRIPPED_FIELDS: &[&str] = &[
    "search_metadata",
    "search_parameters",
    "search_information",
    "pagination",
    "serpapi_pagination",
];

pub const RATE_LIMIT_MESSAGE: &str = "Error: Rate limit exceeded. Please try again later.";
pub const INVALID_KEY_MESSAGE: &str =
    "Error: Invalid SerpApi API key. Check your API key in the path or Authorization header.";
pub const FORBIDDEN_MESSAGE: &str =
    "Error: SerpApi API key forbidden. Verify your subscription and key validity.";
pub const MISSING_CONTEXT_MESSAGE: &str =
    "Error: Unable to access API key from request context.";

/// How much of the upstream document is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Complete,
    Compact,
}

impl FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(Self::Complete),
            "compact" => Ok(Self::Compact),
            other => Err(format!(
                "Error: Invalid mode '{}'. Mode must be 'complete' or 'compact'.",
                other
            )),
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseMode::Complete => f.write_str("complete"),
            ResponseMode::Compact => f.write_str("compact"),
        }
    }
}

fn default_engine() -> String {
    DEFAULT_ENGINE.to_string()
}

fn default_num() -> u32 {
    DEFAULT_NUM
}

/// Accept `num` as an integer or a numeric string.
fn deserialize_num<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumArg {
        Int(u32),
        Text(String),
    }

    match NumArg::deserialize(deserializer)? {
        NumArg::Int(n) => Ok(n),
        NumArg::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid num '{}'", s))),
    }
}

fn default_mode() -> String {
    ResponseMode::Complete.to_string()
}

/// Arguments accepted by the `search` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    /// Query text.
    pub q: String,
    /// Location filter, e.g. "Austin, Texas".
    pub location: String,
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Result-count hint.
    #[serde(default = "default_num", deserialize_with = "deserialize_num")]
    pub num: u32,
    /// `complete` or `compact`; validated at dispatch time.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Engine-specific parameters forwarded unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Text result of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(text: String) -> Self {
        Self { text, is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Run the `search` tool from raw JSON arguments.
pub async fn search_tool(
    client: &dyn SearchClient,
    context: Option<&RequestContext>,
    arguments: Value,
) -> ToolOutput {
    match serde_json::from_value::<SearchArgs>(arguments) {
        Ok(args) => dispatch_search(client, context, args).await,
        Err(e) => ToolOutput::error(format!("Error: Invalid search arguments: {}", e)),
    }
}

/// Validate, call upstream with the request's credential, and shape the result.
pub async fn dispatch_search(
    client: &dyn SearchClient,
    context: Option<&RequestContext>,
    args: SearchArgs,
) -> ToolOutput {
    let mode = match args.mode.parse::<ResponseMode>() {
        Ok(mode) => mode,
        Err(message) => return ToolOutput::error(message),
    };

    let Some(context) = context else {
        tracing::error!("Search dispatched without a resolved credential");
        return ToolOutput::error(MISSING_CONTEXT_MESSAGE);
    };

    let request = build_upstream_request(context, &args);
    let start = std::time::Instant::now();

    match client.search(&request).await {
        Ok(document) => {
            tracing::info!(
                engine = %args.engine,
                mode = %mode,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Search completed"
            );
            let shaped = apply_mode(document, mode);
            match serde_json::to_string_pretty(&shaped) {
                Ok(text) => ToolOutput::ok(text),
                Err(e) => ToolOutput::error(format!("Error: {}", e)),
            }
        }
        Err(err) => {
            let status = http_status(&err);
            tracing::warn!(
                engine = %args.engine,
                status = ?status,
                error = %err,
                "Search failed"
            );
            ToolOutput::error(match status {
                Some(429) => RATE_LIMIT_MESSAGE.to_string(),
                Some(401) => INVALID_KEY_MESSAGE.to_string(),
                Some(403) => FORBIDDEN_MESSAGE.to_string(),
                _ => format!("Error: {}", normalize_error(&err)),
            })
        }
    }
}

/// Merge the resolved credential, engine and caller fields into one request.
///
/// A caller-supplied `api_key` is dropped; only the resolved credential is sent.
pub fn build_upstream_request(context: &RequestContext, args: &SearchArgs) -> UpstreamRequest {
    let mut request = UpstreamRequest::new(context.credential().expose(), &args.engine)
        .param("q", args.q.as_str())
        .param("location", args.location.as_str())
        .param("num", args.num.to_string());

    for (key, value) in &args.extra {
        if key == "api_key" {
            continue;
        }
        let value = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        request = request.param(key.as_str(), value);
    }

    request
}

/// Strip metadata-only fields in compact mode; pass the document through otherwise.
pub fn apply_mode(mut document: Value, mode: ResponseMode) -> Value {
    if mode == ResponseMode::Compact {
        if let Value::Object(map) = &mut document {
            map.retain(|key, _| !COMPACT_STRIPPED_FIELDS.contains(&key.as_str()));
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, CredentialSource};
    use crate::error::UpstreamError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeClient {
        result: Mutex<Option<Result<Value, UpstreamError>>>,
        calls: AtomicUsize,
        last: Mutex<Option<UpstreamRequest>>,
    }

    impl FakeClient {
        fn returning(result: Result<Value, UpstreamError>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SearchClient for FakeClient {
        async fn search(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(json!({})))
        }
    }

    fn context(key: &str) -> RequestContext {
        RequestContext::new(Credential::new(key), CredentialSource::Header)
    }

    fn args(mode: &str) -> Value {
        json!({ "q": "coffee", "location": "Austin, Texas", "mode": mode })
    }

    fn upstream_document() -> Value {
        json!({
            "search_metadata": { "id": "abc" },
            "search_parameters": { "q": "coffee" },
            "search_information": { "total_results": 10 },
            "organic_results": [{ "title": "Café Olé" }],
            "pagination": { "next": "x" },
            "serpapi_pagination": { "next": "y" }
        })
    }

    #[tokio::test]
    async fn test_invalid_mode_never_calls_upstream() {
        let client = FakeClient::returning(Ok(json!({})));
        let output = search_tool(&client, Some(&context("k")), args("verbose")).await;

        assert!(output.is_error);
        assert!(output.text.contains("'verbose'"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_context_is_reported() {
        let client = FakeClient::returning(Ok(json!({})));
        let output = search_tool(&client, None, args("complete")).await;

        assert_eq!(output, ToolOutput::error(MISSING_CONTEXT_MESSAGE));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_required_argument_is_reported() {
        let client = FakeClient::returning(Ok(json!({})));
        let output = search_tool(&client, Some(&context("k")), json!({ "q": "coffee" })).await;

        assert!(output.is_error);
        assert!(output.text.contains("location"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_complete_mode_returns_full_document() {
        let client = FakeClient::returning(Ok(upstream_document()));
        let output = search_tool(&client, Some(&context("k")), args("complete")).await;

        assert!(!output.is_error);
        assert_eq!(output.text, serde_json::to_string_pretty(&upstream_document()).unwrap());
        assert!(output.text.contains("Café Olé"));
    }

    #[tokio::test]
    async fn test_compact_mode_strips_metadata() {
        let client = FakeClient::returning(Ok(upstream_document()));
        let output = search_tool(&client, Some(&context("k")), args("compact")).await;

        let parsed: Value = serde_json::from_str(&output.text).unwrap();
        let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["organic_results"]);
    }

    #[tokio::test]
    async fn test_request_merges_credential_engine_and_fields() {
        let client = FakeClient::returning(Ok(json!({})));
        let arguments = json!({
            "q": "coffee",
            "location": "Austin, Texas",
            "hl": "en",
            "safe": true,
            "api_key": "spoofed",
            "start": null
        });
        search_tool(&client, Some(&context("real-key")), arguments).await;

        let sent = client.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.get("api_key"), Some("real-key"));
        assert_eq!(sent.get("engine"), Some(DEFAULT_ENGINE));
        assert_eq!(sent.get("num"), Some("10"));
        assert_eq!(sent.get("hl"), Some("en"));
        assert_eq!(sent.get("safe"), Some("true"));
        assert_eq!(sent.get("start"), None);
    }

    #[tokio::test]
    async fn test_num_accepts_numeric_string() {
        let client = FakeClient::returning(Ok(json!({})));
        let arguments = json!({ "q": "coffee", "location": "Austin, Texas", "num": "20" });
        let output = search_tool(&client, Some(&context("k")), arguments).await;

        assert!(!output.is_error);
        let sent = client.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.get("num"), Some("20"));
    }

    #[tokio::test]
    async fn test_num_rejects_non_numeric_string() {
        let client = FakeClient::returning(Ok(json!({})));
        let arguments = json!({ "q": "coffee", "location": "Austin, Texas", "num": "twenty" });
        let output = search_tool(&client, Some(&context("k")), arguments).await;

        assert!(output.is_error);
        assert!(output.text.starts_with("Error: Invalid search arguments"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_status_errors_map_to_fixed_messages() {
        let cases = [
            (429, RATE_LIMIT_MESSAGE),
            (401, INVALID_KEY_MESSAGE),
            (403, FORBIDDEN_MESSAGE),
        ];
        for (status, expected) in cases {
            let err = UpstreamError::wrap("failed", UpstreamError::status(status, Some("{}".into())));
            let client = FakeClient::returning(Err(err));
            let output = search_tool(&client, Some(&context("k")), args("complete")).await;
            assert_eq!(output, ToolOutput::error(expected));
        }
    }

    #[tokio::test]
    async fn test_other_failures_are_normalized() {
        let err = UpstreamError::wrap(
            "failed",
            UpstreamError::status(400, Some(r#"{"error":"Unsupported engine"}"#.into())),
        );
        let client = FakeClient::returning(Err(err));
        let output = search_tool(&client, Some(&context("k")), args("complete")).await;

        assert!(output.is_error);
        assert!(output.text.starts_with("Error: {"));
        assert!(output.text.contains("Unsupported engine"));

        let client = FakeClient::returning(Err(UpstreamError::transport("connection refused")));
        let output = search_tool(&client, Some(&context("k")), args("complete")).await;
        assert_eq!(output, ToolOutput::error("Error: connection refused"));
    }

    #[test]
    fn test_apply_mode_ignores_non_objects() {
        let doc = json!(["search_metadata"]);
        assert_eq!(apply_mode(doc.clone(), ResponseMode::Compact), doc);
    }
}
