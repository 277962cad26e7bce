use anyhow::Result;
use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::debug::preview_order;
use super::metrics::metrics_handler;
use super::state::ServerState;
use super::{log_requests, require_allowed_origin};
use crate::mcp::handler::{mcp_delete, mcp_info, mcp_post, mcp_stream, mcp_tools, SERVER_NAME};

#[derive(Serialize)]
struct ServerBanner {
    pub name: &'static str,
    pub version: String,
    pub status: &'static str,
    pub mcp_endpoint: &'static str,
    pub uptime: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerBanner {
        name: SERVER_NAME,
        version: state.mcp_state.server_version.clone(),
        status: "online",
        mcp_endpoint: "/mcp",
        uptime: format_uptime(state.start_time.elapsed()),
    })
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVER_NAME,
        "version": state.mcp_state.server_version,
    }))
}

pub fn make_app(state: ServerState) -> Router {
    let mcp_routes: Router = Router::new()
        .route("/mcp", post(mcp_post).get(mcp_stream).delete(mcp_delete))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_allowed_origin,
        ))
        .with_state(state.clone());

    let mut app: Router = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/mcp/info", get(mcp_info))
        .route("/mcp/tools", get(mcp_tools))
        .with_state(state.clone())
        .merge(mcp_routes);

    if state.config.enable_debug_routes {
        info!("Debug routes enabled");
        app = app.route("/debug/pedido/preview", post(preview_order));
    }

    app.layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(CorsLayer::permissive())
}

pub async fn run_metrics_server(port: u16) -> Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Metrics available at port {}", port);
    Ok(axum::serve(listener, app).await?)
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let address = format!("{}:{}", state.config.bind_address, state.config.port);
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Ready to serve at {}", address);

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erp::transport::testing::RecordingTransport;
    use crate::mcp::handler::create_mcp_state;
    use crate::mcp::registry::McpRegistry;
    use crate::mcp::session::{InMemorySessionStore, SessionManager};
    use crate::server::auth::UnverifiedClaimsDecoder;
    use crate::server::metrics::HTTP_REQUESTS_TOTAL;
    use crate::server::{ServerConfig, UNMATCHED_ROUTE};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn make_test_app(config: ServerConfig) -> Router {
        let sessions = Arc::new(SessionManager::new(Arc::new(InMemorySessionStore::new(
            Duration::from_secs(60),
            100,
        ))));
        let mcp_state = create_mcp_state(
            Arc::new(McpRegistry::with_all_tools().unwrap()),
            sessions,
            Arc::new(RecordingTransport::new()),
            config.capabilities.to_server_capabilities(),
            "2.0.0-test".to_string(),
        );
        make_app(ServerState::new(
            config,
            Arc::new(mcp_state),
            Arc::new(UnverifiedClaimsDecoder),
        ))
    }

    fn bearer() -> String {
        let payload = json!({"tenant_id": "loja-1", "tiny_token": "erp-secret"});
        format!(
            "Bearer eyJhbGciOiJIUzI1NiJ9.{}.sig",
            URL_SAFE_NO_PAD.encode(payload.to_string())
        )
    }

    fn mcp_post_request() -> axum::http::request::Builder {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn responds_unauthorized_without_token() {
        let app = make_test_app(ServerConfig::default());

        let body = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        let request = mcp_post_request().body(Body::from(body)).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_json(response).await["detail"].is_string());
    }

    #[tokio::test]
    async fn rejects_foreign_origin_before_auth() {
        let app = make_test_app(ServerConfig::default());

        let request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("origin", "https://evil.example.com")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn rejects_invalid_json_body() {
        let app = make_test_app(ServerConfig::default());

        let request = mcp_post_request()
            .header("authorization", bearer())
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "Invalid JSON");
    }

    #[tokio::test]
    async fn notification_is_accepted_without_body() {
        let app = make_test_app(ServerConfig::default());

        let body = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let request = mcp_post_request()
            .header("authorization", bearer())
            .header("mcp-session-id", "s-42")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn echoes_session_and_protocol_headers() {
        let app = make_test_app(ServerConfig::default());

        let body = r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#;
        let request = mcp_post_request()
            .header("authorization", bearer())
            .header("origin", "http://localhost:3000")
            .header("mcp-session-id", "s-7")
            .header("mcp-protocol-version", "2025-03-26")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["mcp-session-id"], "s-7");
        assert_eq!(response.headers()["mcp-protocol-version"], "2025-03-26");

        let reply = body_json(response).await;
        assert_eq!(reply["id"], 7);
        assert_eq!(reply["result"], json!({}));
    }

    #[tokio::test]
    async fn public_routes_describe_the_gateway() {
        let app = make_test_app(ServerConfig::default());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let banner = body_json(response).await;
        assert_eq!(banner["status"], "online");
        assert_eq!(banner["mcp_endpoint"], "/mcp");

        let response = app
            .oneshot(Request::builder().uri("/mcp/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["total"], 77);
    }

    #[tokio::test]
    async fn debug_routes_are_gated() {
        let order = r#"{"cliente":{"nome":"Ana"}}"#;
        let preview = || {
            Request::builder()
                .method("POST")
                .uri("/debug/pedido/preview")
                .body(Body::from(order))
                .unwrap()
        };

        let response = make_test_app(ServerConfig::default())
            .oneshot(preview())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let config = ServerConfig {
            enable_debug_routes: true,
            ..ServerConfig::default()
        };
        let response = make_test_app(config).oneshot(preview()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    fn route_labels() -> Vec<String> {
        use prometheus::core::Collector;

        HTTP_REQUESTS_TOTAL
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .flat_map(|metric| metric.get_label())
            .filter(|label| label.get_name() == "route")
            .map(|label| label.get_value().to_string())
            .collect()
    }

    #[tokio::test]
    async fn unknown_paths_share_one_metrics_series() {
        let app = make_test_app(ServerConfig::default());
        let unmatched = || {
            HTTP_REQUESTS_TOTAL
                .with_label_values(&["GET", UNMATCHED_ROUTE, "404"])
                .get()
        };
        let before = unmatched();

        for path in ["/scan/one", "/scan/two", "/wp-login.php"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert!(unmatched() - before >= 3.0);
        let labels = route_labels();
        assert!(!labels.iter().any(|route| route.starts_with("/scan")));
        assert!(!labels.iter().any(|route| route == "/wp-login.php"));
        assert!(labels.iter().any(|route| route == "/health"));
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }
}
