//! Type definitions for the engine catalog.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Address of the engine index resource.
pub const INDEX_URI: &str = "serpapi://engines";

/// Resource address of a single engine descriptor.
pub fn engine_uri(engine: &str) -> String {
    format!("{}/{}", INDEX_URI, engine)
}

/// Whether `name` is a valid engine identifier (`^[a-z0-9_]+$`).
pub fn is_valid_engine_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Normalized metadata for one upstream request parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Allowed values; either bare values or `[value, label]` pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Name of the parameter group the upstream documentation lists it under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Static description of the parameters one search engine accepts.
///
/// Parameter maps keep the order they were written in, so a descriptor read
/// back from the catalog matches its file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    pub engine: String,

    #[serde(default)]
    pub params: Map<String, Value>,

    #[serde(default)]
    pub common_params: Map<String, Value>,
}

impl EngineDescriptor {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            params: Map::new(),
            common_params: Map::new(),
        }
    }

    /// Typed view of an engine-specific parameter.
    pub fn param(&self, name: &str) -> Option<ParamDescriptor> {
        self.params
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Names of parameters the engine marks as required.
    pub fn required_params(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(_, v)| v.get("required").and_then(Value::as_bool) == Some(true))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Aggregate view over every registered engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineIndex {
    pub count: usize,
    pub engines: Vec<String>,
    pub resources: Vec<String>,
    pub schema: Value,
}

impl EngineIndex {
    pub fn from_engines(engines: Vec<String>) -> Self {
        let resources = engines.iter().map(|e| engine_uri(e)).collect();
        Self {
            count: engines.len(),
            engines,
            resources,
            schema: descriptor_schema(),
        }
    }
}

/// Fixed description of the descriptor document shape, published with the index.
fn descriptor_schema() -> Value {
    json!({
        "note": "Each engine resource lists the parameters accepted by that engine.",
        "engine": "Engine identifier, passed as the `engine` argument of the search tool.",
        "params": "Engine-specific parameters keyed by name.",
        "common_params": "Parameters shared by every engine, keyed by name.",
        "param_fields": {
            "type": "Parameter value type.",
            "options": "Allowed values, either bare or as [value, label] pairs.",
            "required": "Whether the engine requires the parameter.",
            "description": "Plain-text documentation of the parameter.",
            "group": "Documentation group the parameter belongs to."
        }
    })
}
