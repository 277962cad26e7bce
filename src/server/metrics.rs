use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all gateway metrics
const PREFIX: &str = "tiny_mcp";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP surface
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "route", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["method", "route"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // JSON-RPC
    pub static ref MCP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_rpc_requests_total"), "Total JSON-RPC messages by method"),
        &["method", "outcome"]
    ).expect("Failed to create rpc_requests_total metric");

    pub static ref TOOL_CALLS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_tool_calls_total"), "Total tool calls by tool and outcome"),
        &["tool", "outcome"]
    ).expect("Failed to create tool_calls_total metric");

    // Upstream ERP
    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_upstream_request_duration_seconds"),
            "Tiny ERP request duration in seconds"
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint", "outcome"]
    ).expect("Failed to create upstream_request_duration_seconds metric");

    pub static ref ACTIVE_SESSIONS: Gauge = Gauge::new(
        format!("{PREFIX}_active_sessions"),
        "Number of live MCP sessions"
    ).expect("Failed to create active_sessions metric");
}

pub fn init_metrics() {
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(MCP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(TOOL_CALLS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ACTIVE_SESSIONS.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// `route` is the matched route template, not the request path.
pub fn record_http_request(method: &str, route: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(duration.as_secs_f64());
}

/// Record a handled JSON-RPC message. `outcome` is "ok", "error" or "notification".
pub fn record_rpc_request(method: &str, outcome: &str) {
    MCP_REQUESTS_TOTAL
        .with_label_values(&[method, outcome])
        .inc();
}

pub fn record_tool_call(tool: &str, outcome: &str) {
    TOOL_CALLS_TOTAL.with_label_values(&[tool, outcome]).inc();
}

pub fn record_upstream_request(endpoint: &str, outcome: &str, duration: Duration) {
    UPSTREAM_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint, outcome])
        .observe(duration.as_secs_f64());
}

pub fn set_active_sessions(count: usize) {
    ACTIVE_SESSIONS.set(count as f64);
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
