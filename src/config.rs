use std::env;
use std::path::PathBuf;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line, for log shippers.
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" | "structured" => Self::Json,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory holding one `<engine>.json` descriptor per engine.
    pub engines_dir: PathBuf,
    /// Base URL of the upstream search API (no trailing `/search.json`).
    pub upstream_base_url: String,
    /// Request timeout enforced by the upstream HTTP client.
    pub upstream_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
    /// Reported by the health endpoint and used as the `Service` metric dimension.
    pub service_name: String,
    pub metrics_namespace: String,
    /// Optional port for the Prometheus scrape listener.
    pub metrics_port: Option<u16>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            engines_dir: PathBuf::from("./engines"),
            upstream_base_url: "https://serpapi.com".to_string(),
            upstream_timeout_secs: 30,
            shutdown_timeout_secs: 5,
            service_name: "serpapi-mcp-server".to_string(),
            metrics_namespace: "mcp".to_string(),
            metrics_port: None,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let metrics_port = match env::var("METRICS_PORT") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse()?),
            _ => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()?,
            engines_dir: env::var("ENGINES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.engines_dir),
            upstream_base_url: env::var("SERPAPI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.upstream_base_url),
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.upstream_timeout_secs.to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| defaults.shutdown_timeout_secs.to_string())
                .parse()?,
            service_name: env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            metrics_namespace: env::var("METRICS_NAMESPACE").unwrap_or(defaults.metrics_namespace),
            metrics_port,
            log_format: LogFormat::from_env(),
        })
    }

    /// Socket address string the gateway binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.engines_dir, PathBuf::from("./engines"));
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert!(config.metrics_port.is_none());
    }
}
