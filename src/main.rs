use metrics_exporter_prometheus::PrometheusBuilder;
use serpgate::config::LogFormat;
use serpgate::{build_app, AppState, Config, EngineCatalog, SerpApiClient};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "serpgate=info,tower_http=info".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!("Starting SerpApi MCP gateway");

    let shutdown_timeout = config.shutdown_timeout_secs;
    let addr: SocketAddr = config.bind_address().parse()?;

    // Prometheus scrape listener, only when a port is configured
    if let Some(port) = config.metrics_port {
        let metrics_addr = SocketAddr::new(addr.ip(), port);
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;
        tracing::info!(address = %metrics_addr, "Metrics exporter listening");
    }

    // Engine catalog is read-only from here on
    let start = std::time::Instant::now();
    let catalog = EngineCatalog::load(&config.engines_dir)?;
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        engines = catalog.len(),
        "Catalog initialized",
    );

    let client = SerpApiClient::new(
        &config.upstream_base_url,
        Duration::from_secs(config.upstream_timeout_secs),
    )?;

    let state = Arc::new(AppState::new(config, catalog, Arc::new(client)));
    let app = build_app(state);

    // Create TCP listener
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
/// After signal, allows `timeout_secs` for in-flight requests to complete.
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    // Give in-flight requests time to complete
    tracing::info!(timeout_secs, "Draining connections...");
    tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
}
