//! Origin check for the MCP endpoint (DNS rebinding protection).

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use super::super::state::ServerState;

/// An origin passes when it contains any allowed fragment. An empty list allows all.
pub fn is_origin_allowed(origin: &str, allowed: &[String]) -> bool {
    allowed.is_empty() || allowed.iter().any(|fragment| origin.contains(fragment.as_str()))
}

/// Requests without an `Origin` header (non-browser clients) pass through.
pub async fn require_allowed_origin(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        let origin = origin.to_str().unwrap_or_default();
        if !is_origin_allowed(origin, &state.config.allowed_origins) {
            warn!("Rejected request from origin {:?}", origin);
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "detail": "Origin not allowed" })),
            )
                .into_response();
        }
    }

    next.run(request).await
}
