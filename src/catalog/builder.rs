//! Offline construction of engine descriptor files.
//!
//! Input is the upstream playground's props document, whose `parameters` key
//! maps each engine to its documented parameter groups. Output is one
//! descriptor file per engine, in the shape the gateway's catalog loader reads.

use crate::catalog::types::{is_valid_engine_name, EngineDescriptor};
use crate::error::{AppError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Engines never written to the catalog.
pub const EXCLUDED_ENGINES: &[&str] = &[
    "google_scholar_profiles",
    "google_light_fast",
    "google_lens_image_sources",
];

/// Group whose parameters apply to every engine.
pub const COMMON_GROUP: &str = "serpapi_parameters";

const PARAM_KEEP_KEYS: &[&str] = &["html", "type", "options", "required"];

/// Wrap width for html2text; wide enough that lines are never wrapped.
const TEXT_WIDTH: usize = 10_000;

/// Convert an HTML fragment to single-line plain text.
pub fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH).unwrap_or_else(|_| html.to_string());
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse `[value, label]` option pairs to `value`, except when the value is
/// numeric and the label carries information the value does not.
pub fn normalize_options(options: &[Value]) -> Vec<Value> {
    options
        .iter()
        .map(|option| match option.as_array() {
            Some(pair) if !pair.is_empty() => {
                let value = &pair[0];
                let numeric = value.is_number()
                    || value
                        .as_str()
                        .is_some_and(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()));
                match pair.get(1) {
                    Some(label) if numeric && value != label => option.clone(),
                    _ => value.clone(),
                }
            }
            _ => option.clone(),
        })
        .collect()
}

/// Reduce one raw parameter to the descriptor fields, or `None` when nothing is kept.
fn normalize_param(param: &Map<String, Value>, group: &str) -> Option<Value> {
    let mut filtered: Map<String, Value> = param
        .iter()
        .filter(|(k, _)| PARAM_KEEP_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if let Some(Value::Array(options)) = filtered.get("options") {
        let normalized = normalize_options(options);
        filtered.insert("options".to_string(), Value::Array(normalized));
    }

    if let Some(html) = filtered.remove("html") {
        if let Some(html) = html.as_str() {
            filtered.insert("description".to_string(), Value::String(html_to_text(html)));
        }
    }

    if filtered.is_empty() {
        return None;
    }
    filtered.insert("group".to_string(), Value::String(group.to_string()));
    Some(Value::Object(filtered))
}

/// Build the descriptor for `engine` from its playground payload.
pub fn normalize_engine(engine: &str, payload: &Value) -> EngineDescriptor {
    let mut descriptor = EngineDescriptor::new(engine);

    let Some(groups) = payload.as_object() else {
        return descriptor;
    };

    for (group_name, group) in groups {
        let Some(params) = group.get("parameters").and_then(Value::as_object) else {
            continue;
        };
        for (param_name, param) in params {
            let Some(param) = param.as_object() else {
                continue;
            };
            let Some(normalized) = normalize_param(param, group_name) else {
                continue;
            };
            if group_name == COMMON_GROUP {
                descriptor.common_params.insert(param_name.clone(), normalized);
            } else {
                descriptor.params.insert(param_name.clone(), normalized);
            }
        }
    }

    descriptor
}

/// Normalize every eligible engine in a playground props document.
pub fn build_descriptors(props: &Value) -> Result<Vec<EngineDescriptor>> {
    let engines = props
        .get("parameters")
        .and_then(Value::as_object)
        .ok_or_else(|| AppError::CatalogError("Playground props missing 'parameters' map".into()))?;

    let mut descriptors: Vec<EngineDescriptor> = engines
        .iter()
        .filter(|(engine, _)| !EXCLUDED_ENGINES.contains(&engine.as_str()))
        .filter(|(engine, _)| {
            let valid = is_valid_engine_name(engine);
            if !valid {
                tracing::warn!(engine = %engine, "Skipping engine with invalid identifier");
            }
            valid
        })
        .filter(|(_, payload)| payload.is_object())
        .map(|(engine, payload)| normalize_engine(engine, payload))
        .collect();

    descriptors.sort_by(|a, b| a.engine.cmp(&b.engine));
    Ok(descriptors)
}

/// Write each descriptor to `<out_dir>/<engine>.json`, replacing existing files.
pub fn write_descriptors(out_dir: &Path, descriptors: &[EngineDescriptor]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let path = out_dir.join(format!("{}.json", descriptor.engine));
        let body = serde_json::to_string_pretty(descriptor)
            .map_err(|e| AppError::CatalogError(format!("Engine '{}': {}", descriptor.engine, e)))?;
        std::fs::write(&path, body)?;
        written.push(path);
    }

    Ok(written)
}
