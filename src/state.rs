use crate::catalog::EngineCatalog;
use crate::config::Config;
use crate::search::SearchClient;
use crate::server::ToolRegistry;
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// Everything here is read-only after startup. Per-request data (the caller's
/// credential) travels with the request, never through this struct.
pub struct AppState {
    pub catalog: Arc<EngineCatalog>,
    pub tools: Arc<ToolRegistry>,
    pub client: Arc<dyn SearchClient>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, catalog: EngineCatalog, client: Arc<dyn SearchClient>) -> Self {
        tracing::info!(
            engines = catalog.len(),
            service = %config.service_name,
            "Application state initialized"
        );

        Self {
            catalog: Arc::new(catalog),
            tools: Arc::new(ToolRegistry::standard()),
            client,
            config: Arc::new(config),
        }
    }
}
