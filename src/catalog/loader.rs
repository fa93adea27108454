//! Startup scan of the engine descriptor directory.
//!
//! Scanning is split from registration: `scan_engines` only reads and parses
//! files, returning validated descriptors for `EngineCatalog::from_descriptors`
//! to bind to resource addresses.

use crate::catalog::types::{is_valid_engine_name, EngineDescriptor};
use crate::error::{AppError, Result};
use std::path::Path;

/// Read every `<engine>.json` in `dir` and parse it as an engine descriptor.
///
/// Files whose stem fails the engine naming rule, and files that do not parse,
/// are logged and skipped. A missing directory yields an empty list.
/// Descriptors are returned sorted by engine identifier.
pub fn scan_engines(dir: &Path) -> Result<Vec<EngineDescriptor>> {
    if !dir.is_dir() {
        tracing::warn!(
            path = %dir.display(),
            "Engines directory not found, serving an empty catalog"
        );
        return Ok(Vec::new());
    }

    let mut descriptors = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!(path = %path.display(), "Skipping engine file with non-UTF-8 name");
            continue;
        };

        if !is_valid_engine_name(name) {
            tracing::warn!(
                path = %path.display(),
                "Skipping engine file: name must match ^[a-z0-9_]+$"
            );
            continue;
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable engine file");
                continue;
            }
        };

        match parse_descriptor(name, &contents) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping malformed engine file");
            }
        }
    }

    descriptors.sort_by(|a, b| a.engine.cmp(&b.engine));

    tracing::debug!(
        path = %dir.display(),
        engines = descriptors.len(),
        "Engine scan complete"
    );

    Ok(descriptors)
}

/// Parse one descriptor document registered under `name`.
///
/// The file name is authoritative: a differing `engine` field inside the
/// document is replaced so the descriptor is always addressable by its file.
pub fn parse_descriptor(name: &str, contents: &str) -> Result<EngineDescriptor> {
    if !is_valid_engine_name(name) {
        return Err(AppError::CatalogError(format!(
            "Invalid engine identifier '{}'",
            name
        )));
    }

    let mut descriptor: EngineDescriptor = serde_json::from_str(contents)
        .map_err(|e| AppError::CatalogError(format!("Engine '{}': {}", name, e)))?;

    if descriptor.engine != name {
        tracing::warn!(
            file = name,
            declared = %descriptor.engine,
            "Engine field does not match file name, using file name"
        );
        descriptor.engine = name.to_string();
    }

    Ok(descriptor)
}
