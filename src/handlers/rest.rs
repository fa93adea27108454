//! Path-addressed tool and resource endpoints under `/mcp`.

use crate::auth::RequestContext;
use crate::catalog::{EngineDescriptor, EngineIndex};
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;

/// POST /mcp/tools/:name - Invoke a tool with a JSON arguments body.
///
/// Responds 200 with the tool's text output, including tool errors.
pub async fn tool_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    context: Option<Extension<RequestContext>>,
    body: Bytes,
) -> Result<Response> {
    let tool = state
        .tools
        .get(&name)
        .ok_or_else(|| AppError::ResourceNotFound(format!("tool '{}'", name)))?;

    let arguments = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(arguments) => arguments,
            Err(e) => {
                return Ok(plain_text(format!("Error: Invalid JSON arguments: {}", e)));
            }
        }
    };

    let context = context.map(|Extension(ctx)| ctx);
    let output = tool.call(state.client.as_ref(), context.as_ref(), arguments).await;
    Ok(plain_text(output.text))
}

fn plain_text(text: String) -> Response {
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response()
}

/// GET /mcp/resources/engines - Engine index.
pub async fn engines_index_handler(State(state): State<Arc<AppState>>) -> Json<EngineIndex> {
    Json(state.catalog.index())
}

/// GET /mcp/resources/engines/:engine - One engine descriptor.
pub async fn engine_handler(
    State(state): State<Arc<AppState>>,
    Path(engine): Path<String>,
) -> Result<Json<EngineDescriptor>> {
    state
        .catalog
        .get(&engine)
        .map(|descriptor| Json(descriptor.as_ref().clone()))
        .ok_or_else(|| AppError::ResourceNotFound(format!("engine '{}'", engine)))
}
