//! Per-request metric events.
//!
//! Every request produces exactly one `MetricEvent`, written as a CloudWatch
//! embedded-metric-format log line and recorded through the `metrics` facade.
//! Emission is best effort and never alters the response.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const METRICS_TARGET: &str = "serpgate::metrics";

/// Static identity attached to every metric event.
#[derive(Debug, Clone)]
pub struct MetricsSettings {
    pub namespace: String,
    pub service: String,
}

/// One request's worth of metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    pub namespace: String,
    pub service: String,
    pub method: String,
    pub status: u16,
    pub request_count: u64,
    pub response_time_ms: f64,
}

impl MetricEvent {
    /// Embedded-metric-format document for this event.
    pub fn to_emf(&self, timestamp_ms: i64) -> Value {
        json!({
            "_aws": {
                "Timestamp": timestamp_ms,
                "CloudWatchMetrics": [{
                    "Namespace": self.namespace,
                    "Dimensions": [["Service", "Method", "Status"]],
                    "Metrics": [
                        { "Name": "RequestCount", "Unit": "Count" },
                        { "Name": "ResponseTime", "Unit": "Milliseconds" }
                    ]
                }]
            },
            "Service": self.service,
            "Method": self.method,
            "Status": self.status.to_string(),
            "RequestCount": self.request_count,
            "ResponseTime": self.response_time_ms
        })
    }

    /// Write the event. Failures are logged and swallowed.
    pub fn emit(&self) {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        match serde_json::to_string(&self.to_emf(timestamp_ms)) {
            Ok(line) => tracing::info!(target: METRICS_TARGET, "{}", line),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize metric event"),
        }

        let labels = [
            ("service", self.service.clone()),
            ("method", self.method.clone()),
            ("status", self.status.to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(self.request_count);
        metrics::histogram!("http_response_time_ms", &labels).record(self.response_time_ms);
    }
}

/// Outermost middleware: times the request and emits one metric event.
pub async fn metrics_middleware(
    State(settings): State<Arc<MetricsSettings>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let span = tracing::info_span!("request", request_id = %Uuid::new_v4(), method = %method);

    let start = Instant::now();
    let response = next.run(req).instrument(span).await;
    let elapsed = start.elapsed();

    MetricEvent {
        namespace: settings.namespace.clone(),
        service: settings.service.clone(),
        method,
        status: response.status().as_u16(),
        request_count: 1,
        response_time_ms: elapsed.as_secs_f64() * 1000.0,
    }
    .emit();

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> MetricEvent {
        MetricEvent {
            namespace: "mcp".into(),
            service: "serpapi-mcp-server".into(),
            method: "POST".into(),
            status: 401,
            request_count: 1,
            response_time_ms: 12.5,
        }
    }

    #[test]
    fn test_emf_document_shape() {
        let doc = event().to_emf(1_700_000_000_000);

        let directive = &doc["_aws"]["CloudWatchMetrics"][0];
        assert_eq!(directive["Namespace"], "mcp");
        assert_eq!(directive["Dimensions"][0], json!(["Service", "Method", "Status"]));
        assert_eq!(directive["Metrics"][1]["Unit"], "Milliseconds");
        assert_eq!(doc["_aws"]["Timestamp"], 1_700_000_000_000i64);

        assert_eq!(doc["Service"], "serpapi-mcp-server");
        assert_eq!(doc["Method"], "POST");
        assert_eq!(doc["Status"], "401");
        assert_eq!(doc["RequestCount"], 1);
        assert_eq!(doc["ResponseTime"], 12.5);
    }

    #[test]
    fn test_emit_without_recorder_does_not_panic() {
        event().emit();
    }
}
