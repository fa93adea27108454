//! Routing table and service assembly.
//!
//! The tool table is built once by `ToolRegistry::builder` and never mutated;
//! `build_app` wires it, the engine catalog and the middleware stack into one
//! axum service.

use crate::auth::{credential_middleware, RequestContext, HEALTH_PATH};
use crate::handlers::{engine_handler, engines_index_handler, health_handler, mcp_handler, tool_handler};
use crate::search::{dispatcher::DEFAULT_ENGINE, search_tool, SearchClient, ToolOutput};
use crate::state::AppState;
use crate::telemetry::{metrics_middleware, MetricsSettings};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Tools the gateway knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Search,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Search => "search",
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        match self {
            ToolKind::Search => ToolDefinition {
                name: self.name(),
                description: "Search the web through SerpApi. Returns the engine's JSON \
                              document; `compact` mode drops search metadata and pagination. \
                              Engine parameters are listed under the serpapi://engines resources.",
                input_schema: search_input_schema(),
            },
        }
    }

    /// Execute the tool with the caller's request context.
    pub async fn call(
        &self,
        client: &dyn SearchClient,
        context: Option<&RequestContext>,
        arguments: Value,
    ) -> ToolOutput {
        match self {
            ToolKind::Search => search_tool(client, context, arguments).await,
        }
    }
}

fn search_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "q": { "type": "string", "description": "Search query." },
            "location": { "type": "string", "description": "Location to originate the search from, e.g. \"Austin, Texas\"." },
            "engine": { "type": "string", "default": DEFAULT_ENGINE, "description": "Search engine identifier." },
            "num": { "type": "integer", "minimum": 1, "default": 10, "description": "Number of results to request." },
            "mode": { "type": "string", "enum": ["complete", "compact"], "default": "complete", "description": "Response detail level." }
        },
        "required": ["q", "location"],
        "additionalProperties": true
    })
}

/// Advertised tool metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Immutable tool name → tool table.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, ToolKind>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Registry with every tool the gateway ships.
    pub fn standard() -> Self {
        Self::builder().tool(ToolKind::Search).build()
    }

    pub fn get(&self, name: &str) -> Option<ToolKind> {
        self.tools.get(name).copied()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(ToolKind::definition).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: BTreeMap<&'static str, ToolKind>,
}

impl ToolRegistryBuilder {
    pub fn tool(mut self, kind: ToolKind) -> Self {
        self.tools.insert(kind.name(), kind);
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}

/// Assemble the full service: trace → metrics → credential resolver → routes.
///
/// The resolver wraps the inner router as a fallback service, so path rewrites
/// happen before route matching.
pub fn build_app(state: Arc<AppState>) -> Router {
    let metrics = Arc::new(MetricsSettings {
        namespace: state.config.metrics_namespace.clone(),
        service: state.config.service_name.clone(),
    });

    let routes = Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route("/mcp", post(mcp_handler))
        .route("/mcp/tools/:name", post(tool_handler))
        .route("/mcp/resources/engines", get(engines_index_handler))
        .route("/mcp/resources/engines/:engine", get(engine_handler))
        .with_state(state);

    Router::new()
        .fallback_service(routes)
        .layer(from_fn(credential_middleware))
        .layer(from_fn_with_state(metrics, metrics_middleware))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
