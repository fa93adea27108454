//! JSON-RPC 2.0 endpoint for the tool protocol.
//!
//! Protocol-level problems (bad envelope, unknown method or tool, unknown
//! resource) are JSON-RPC errors. Tool failures are successful responses whose
//! content carries the error text and `isError: true`.

use crate::auth::RequestContext;
use crate::catalog::CatalogDocument;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const PROTOCOL_VERSION: &str = "2025-03-26";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;
const RESOURCE_NOT_FOUND: i64 = -32002;

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

/// POST /mcp - JSON-RPC tool protocol endpoint.
pub async fn mcp_handler(
    State(state): State<Arc<AppState>>,
    context: Option<Extension<RequestContext>>,
    body: Bytes,
) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable JSON-RPC body");
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::failure(Value::Null, PARSE_ERROR, "Parse error")),
            )
                .into_response();
        }
    };

    if request.method.starts_with("notifications/") {
        return StatusCode::ACCEPTED.into_response();
    }

    let context = context.map(|Extension(ctx)| ctx);
    Json(handle_request(&state, context.as_ref(), request).await).into_response()
}

/// Dispatch one JSON-RPC request against the routing table and catalog.
pub async fn handle_request(
    state: &AppState,
    context: Option<&RequestContext>,
    request: JsonRpcRequest,
) -> JsonRpcResponse {
    let id = request.id.unwrap_or(Value::Null);

    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::failure(id, INVALID_REQUEST, "Invalid JSON-RPC version");
    }

    let params = request.params.unwrap_or(Value::Null);

    match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {}, "resources": {} },
                "serverInfo": {
                    "name": state.config.service_name,
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => {
            JsonRpcResponse::success(id, json!({ "tools": state.tools.definitions() }))
        }
        "tools/call" => {
            let call: ToolCallParams = match serde_json::from_value(params) {
                Ok(call) => call,
                Err(e) => {
                    return JsonRpcResponse::failure(id, INVALID_PARAMS, format!("Invalid tool call params: {}", e))
                }
            };
            let Some(tool) = state.tools.get(&call.name) else {
                return JsonRpcResponse::failure(id, INVALID_PARAMS, format!("Unknown tool: {}", call.name));
            };

            let arguments = call.arguments.unwrap_or_else(|| json!({}));
            let output = tool.call(state.client.as_ref(), context, arguments).await;
            JsonRpcResponse::success(
                id,
                json!({
                    "content": [{ "type": "text", "text": output.text }],
                    "isError": output.is_error
                }),
            )
        }
        "resources/list" => {
            JsonRpcResponse::success(id, json!({ "resources": state.catalog.resources() }))
        }
        "resources/read" => {
            let read: ResourceReadParams = match serde_json::from_value(params) {
                Ok(read) => read,
                Err(e) => {
                    return JsonRpcResponse::failure(id, INVALID_PARAMS, format!("Invalid resource params: {}", e))
                }
            };
            let Some(document) = state.catalog.read(&read.uri) else {
                return JsonRpcResponse::failure(id, RESOURCE_NOT_FOUND, format!("Resource not found: {}", read.uri));
            };
            match resource_contents(&read.uri, &document) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => internal_failure(id, e),
            }
        }
        other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
    }
}

/// `resources/read` result for one catalog document.
fn resource_contents(uri: &str, document: &CatalogDocument) -> serde_json::Result<Value> {
    let text = serde_json::to_string_pretty(&document.to_value()?)?;
    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": "application/json",
            "text": text
        }]
    }))
}

/// Server-side failure while building a result.
fn internal_failure(id: Value, err: serde_json::Error) -> JsonRpcResponse {
    tracing::error!(error = %err, "Failed to serialize JSON-RPC result");
    JsonRpcResponse::failure(id, INTERNAL_ERROR, format!("Internal error: {}", err))
}
