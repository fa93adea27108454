use crate::catalog::loader::scan_engines;
use crate::catalog::types::{engine_uri, EngineDescriptor, EngineIndex, INDEX_URI};
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A readable catalog document, as advertised in resource listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceEntry {
    pub uri: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

/// Document addressed by a resource URI.
#[derive(Debug, Clone)]
pub enum CatalogDocument {
    Index(EngineIndex),
    Engine(Arc<EngineDescriptor>),
}

impl CatalogDocument {
    pub fn to_value(&self) -> serde_json::Result<Value> {
        match self {
            CatalogDocument::Index(index) => serde_json::to_value(index),
            CatalogDocument::Engine(descriptor) => serde_json::to_value(descriptor.as_ref()),
        }
    }
}

/// Immutable registry of engine descriptors, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct EngineCatalog {
    engines: BTreeMap<String, Arc<EngineDescriptor>>,
}

impl EngineCatalog {
    /// Scan `dir` and register every valid descriptor found.
    pub fn load(dir: &Path) -> Result<Self> {
        let catalog = Self::from_descriptors(scan_engines(dir)?);
        tracing::info!(
            path = %dir.display(),
            engines = catalog.len(),
            "Engine catalog loaded"
        );
        Ok(catalog)
    }

    /// Register already-validated descriptors. Later duplicates are ignored.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = EngineDescriptor>) -> Self {
        let mut engines = BTreeMap::new();
        for descriptor in descriptors {
            if engines.contains_key(&descriptor.engine) {
                tracing::warn!(engine = %descriptor.engine, "Duplicate engine descriptor ignored");
                continue;
            }
            engines.insert(descriptor.engine.clone(), Arc::new(descriptor));
        }
        Self { engines }
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn contains(&self, engine: &str) -> bool {
        self.engines.contains_key(engine)
    }

    pub fn get(&self, engine: &str) -> Option<Arc<EngineDescriptor>> {
        self.engines.get(engine).cloned()
    }

    /// Engine index, derived from the registered set on every call.
    pub fn index(&self) -> EngineIndex {
        EngineIndex::from_engines(self.engines.keys().cloned().collect())
    }

    /// Every readable address: the index first, then one per engine.
    pub fn resources(&self) -> Vec<ResourceEntry> {
        let mut entries = Vec::with_capacity(self.engines.len() + 1);
        entries.push(ResourceEntry {
            uri: INDEX_URI.to_string(),
            name: "engines".to_string(),
            description: "Index of available search engines and their resource addresses"
                .to_string(),
            mime_type: "application/json",
        });
        entries.extend(self.engines.keys().map(|engine| ResourceEntry {
            uri: engine_uri(engine),
            name: engine.clone(),
            description: format!("Parameters accepted by the {} engine", engine),
            mime_type: "application/json",
        }));
        entries
    }

    /// Resolve a resource address to its document.
    pub fn read(&self, uri: &str) -> Option<CatalogDocument> {
        if uri == INDEX_URI {
            return Some(CatalogDocument::Index(self.index()));
        }
        let engine = uri.strip_prefix(INDEX_URI)?.strip_prefix('/')?;
        self.get(engine).map(CatalogDocument::Engine)
    }
}
