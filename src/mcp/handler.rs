//! MCP Streamable HTTP Handler
//!
//! `POST /mcp` carries one JSON-RPC message per request. `GET /mcp` opens a
//! server-sent event stream that only emits keep-alives.

use std::any::Any;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use chrono::Utc;
use futures::{stream, FutureExt, Stream};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::context::ToolContext;
use super::protocol::{
    is_supported_version, methods, InitializeParams, InitializeResult, McpError, McpRequest,
    McpResponse, RequestId, ServerCapabilities, ServerInfo, ToolsCallParams, ToolsCallResult,
    ToolsListResult, MCP_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
use super::registry::McpRegistry;
use super::session::{Session, SessionManager};
use crate::erp::{TinyClient, UpstreamTransport};
use crate::server::auth::TenantAuth;
use crate::server::metrics;
use crate::server::state::GuardedMcpState;
use crate::server::ServerConfig;

pub const SERVER_NAME: &str = "mcp-tiny-erp-server";

pub const HEADER_SESSION_ID: &str = "mcp-session-id";
pub const HEADER_PROTOCOL_VERSION: &str = "mcp-protocol-version";

/// Stands in for the tool name in `Unknown tool:` when the call names none.
const MISSING_TOOL_NAME: &str = "None";

/// State shared by every MCP request
pub struct McpState {
    pub registry: Arc<McpRegistry>,
    pub sessions: Arc<SessionManager>,
    pub transport: Arc<dyn UpstreamTransport>,
    pub capabilities: ServerCapabilities,
    pub server_version: String,
}

pub fn create_mcp_state(
    registry: Arc<McpRegistry>,
    sessions: Arc<SessionManager>,
    transport: Arc<dyn UpstreamTransport>,
    capabilities: ServerCapabilities,
    server_version: String,
) -> McpState {
    info!("MCP gateway ready with {} tools", registry.tool_count());
    McpState {
        registry,
        sessions,
        transport,
        capabilities,
        server_version,
    }
}

impl McpState {
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: SERVER_NAME.to_string(),
            version: self.server_version.clone(),
        }
    }
}

// ============================================================================
// HTTP handlers
// ============================================================================

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// Session id from `_meta.sessionId`, then the header, then a fresh one.
fn resolve_session_id(message: &Value, headers: &HeaderMap) -> String {
    message
        .get("_meta")
        .and_then(|meta| meta.get("sessionId"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(HEADER_SESSION_ID)
                .and_then(|v| v.to_str().ok())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// POST /mcp
pub async fn mcp_post(
    State(mcp): State<GuardedMcpState>,
    TenantAuth(claims): TenantAuth,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let protocol_version = headers
        .get(HEADER_PROTOCOL_VERSION)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(MCP_PROTOCOL_VERSION));
    if let Ok(version) = protocol_version.to_str() {
        if !is_supported_version(version) {
            warn!("Client requested unsupported protocol version {}", version);
        }
    }

    let message: Value = match serde_json::from_slice(&body) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => return detail(StatusCode::BAD_REQUEST, "Request body must be a JSON object"),
        Err(e) => {
            debug!("Rejecting unparsable body: {}", e);
            return detail(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    let session_id = resolve_session_id(&message, &headers);
    let session = match mcp
        .sessions
        .get_or_create(&session_id, &claims.identity, &claims.upstream_token)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            warn!(
                "Tenant {} refused on session {}: {}",
                claims.identity.tenant_id, session_id, e
            );
            return detail(StatusCode::FORBIDDEN, &e.to_string());
        }
    };
    metrics::set_active_sessions(mcp.sessions.active_sessions().await);

    let response = handle_message(&mcp, &session, message).await;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        HeaderName::from_static(HEADER_PROTOCOL_VERSION),
        protocol_version,
    );
    match HeaderValue::from_str(&session.id) {
        Ok(value) => {
            response_headers.insert(HeaderName::from_static(HEADER_SESSION_ID), value);
        }
        Err(_) => debug!("Session id {:?} is not a valid header value", session.id),
    }

    match response {
        Some(response) => (StatusCode::OK, response_headers, Json(response)).into_response(),
        None => (StatusCode::ACCEPTED, response_headers).into_response(),
    }
}

fn keepalive_event() -> Event {
    Event::default().data(
        json!({
            "type": "keepalive",
            "timestamp": Utc::now().to_rfc3339(),
        })
        .to_string(),
    )
}

/// Keep-alive events, the first one immediately.
pub fn keepalive_stream(
    interval: std::time::Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(true, move |first| async move {
        if !first {
            tokio::time::sleep(interval).await;
        }
        Some((Ok(keepalive_event()), false))
    })
}

/// GET /mcp
pub async fn mcp_stream(
    State(config): State<ServerConfig>,
    TenantAuth(claims): TenantAuth,
) -> impl IntoResponse {
    info!(
        "Event stream opened for tenant {}",
        claims.identity.tenant_id
    );

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(keepalive_stream(config.keepalive_interval)),
    )
}

/// DELETE /mcp: ends the session named by the `Mcp-Session-Id` header.
pub async fn mcp_delete(
    State(mcp): State<GuardedMcpState>,
    TenantAuth(claims): TenantAuth,
    headers: HeaderMap,
) -> Response {
    let Some(session_id) = headers
        .get(HEADER_SESSION_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty())
    else {
        return detail(StatusCode::BAD_REQUEST, "Mcp-Session-Id header required");
    };

    match mcp
        .sessions
        .terminate(session_id, &claims.identity.tenant_id)
        .await
    {
        Ok(true) => {
            info!("Session {} terminated by client", session_id);
            metrics::set_active_sessions(mcp.sessions.active_sessions().await);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => detail(StatusCode::NOT_FOUND, "Session not found"),
        Err(e) => detail(StatusCode::FORBIDDEN, &e.to_string()),
    }
}

/// GET /mcp/info
pub async fn mcp_info(State(mcp): State<GuardedMcpState>) -> Json<Value> {
    Json(json!({
        "serverInfo": mcp.server_info(),
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "supportedVersions": SUPPORTED_PROTOCOL_VERSIONS,
        "capabilities": mcp.capabilities,
        "transport": "streamable-http",
        "endpoint": "/mcp",
        "toolsCount": mcp.registry.tool_count(),
    }))
}

/// GET /mcp/tools
pub async fn mcp_tools(State(mcp): State<GuardedMcpState>) -> Json<Value> {
    let tools = mcp.registry.tool_definitions();
    Json(json!({
        "total": tools.len(),
        "tools": tools,
    }))
}

// ============================================================================
// JSON-RPC dispatch
// ============================================================================

/// Handles one JSON-RPC message. Notifications yield `None`.
pub async fn handle_message(
    mcp: &McpState,
    session: &Arc<Session>,
    message: Value,
) -> Option<McpResponse> {
    let raw_id = message.get("id").filter(|id| !id.is_null()).cloned();

    let request: McpRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            let Some(raw_id) = raw_id else {
                debug!("Dropping malformed notification: {}", e);
                return None;
            };
            metrics::record_rpc_request("invalid", "error");
            let id = serde_json::from_value::<RequestId>(raw_id).ok();
            return Some(McpResponse::error(
                id,
                McpError::InvalidRequest(e.to_string()),
            ));
        }
    };

    if request.is_notification() {
        handle_notification(mcp, session, &request).await;
        return None;
    }
    let id = request.id.clone()?;

    debug!("MCP request {} on session {}", request.method, session.id);

    let result = match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(&request, mcp),
        methods::TOOLS_LIST => {
            session.mark_initialized();
            handle_tools_list(mcp)
        }
        methods::TOOLS_CALL => {
            session.mark_initialized();
            handle_tools_call(&request, session, mcp).await
        }
        methods::PING => Ok(json!({})),
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    let method_label = match request.method.as_str() {
        methods::INITIALIZE | methods::TOOLS_LIST | methods::TOOLS_CALL | methods::PING => {
            request.method.as_str()
        }
        _ => "other",
    };

    Some(match result {
        Ok(value) => {
            metrics::record_rpc_request(method_label, "ok");
            McpResponse::success(id, value)
        }
        Err(e) => {
            metrics::record_rpc_request(method_label, "error");
            McpResponse::error(Some(id), e)
        }
    })
}

async fn handle_notification(mcp: &McpState, session: &Session, request: &McpRequest) {
    metrics::record_rpc_request("notification", "notification");
    if request.method == methods::INITIALIZED {
        mcp.sessions.mark_initialized(&session.id).await;
        info!(
            "Session {} initialized for tenant {}",
            session.id, session.tenant.tenant_id
        );
    } else {
        debug!("Ignoring notification {}", request.method);
    }
}

fn handle_initialize(request: &McpRequest, mcp: &McpState) -> Result<Value, McpError> {
    let params: InitializeParams = request
        .params
        .clone()
        .and_then(|p| serde_json::from_value(p).ok())
        .unwrap_or_default();

    match params.protocol_version.as_deref() {
        Some(version) if is_supported_version(version) => {
            debug!("Client announced protocol version {}", version)
        }
        Some(version) => warn!(
            "Client announced unsupported protocol version {}, answering with {}",
            version, MCP_PROTOCOL_VERSION
        ),
        None => debug!("Client did not announce a protocol version"),
    }
    if let Some(client) = &params.client_info {
        info!(
            "MCP client {} {} connected",
            client.name,
            client.version.as_deref().unwrap_or("")
        );
    }

    let result = InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: mcp.capabilities.clone(),
        server_info: mcp.server_info(),
        instructions: format!(
            "Tiny ERP gateway exposing {} tools. Tool names start with tiny_ and map to Tiny API v2 operations.",
            mcp.registry.tool_count()
        ),
    };

    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

fn handle_tools_list(mcp: &McpState) -> Result<Value, McpError> {
    let result = ToolsListResult {
        tools: mcp.registry.tool_definitions(),
    };
    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Tool handler panicked".to_string()
    }
}

async fn handle_tools_call(
    request: &McpRequest,
    session: &Arc<Session>,
    mcp: &McpState,
) -> Result<Value, McpError> {
    // Missing params or a non-string name leave no tool to run.
    let Some(params) = request
        .params
        .clone()
        .and_then(|p| serde_json::from_value::<ToolsCallParams>(p).ok())
    else {
        metrics::record_tool_call("unknown", "error");
        return Err(McpError::InternalError(format!("Unknown tool: {}", MISSING_TOOL_NAME)));
    };

    let tool_label = if mcp.registry.get_tool(&params.name).is_some() {
        params.name.as_str()
    } else {
        "unknown"
    };
    let arguments = params.arguments.clone().unwrap_or_else(|| json!({}));

    let client = TinyClient::new(mcp.transport.clone(), session.upstream_token());
    let ctx = ToolContext::new(session.clone(), client);

    let outcome = AssertUnwindSafe(mcp.registry.dispatch(&params.name, arguments, ctx))
        .catch_unwind()
        .await;

    let value = match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            warn!("Tool {} failed: {}", params.name, e);
            metrics::record_tool_call(tool_label, "error");
            return Err(McpError::InternalError(e.to_string()));
        }
        Err(panic) => {
            let message = panic_message(panic);
            error!("Tool {} panicked: {}", params.name, message);
            metrics::record_tool_call(tool_label, "error");
            return Err(McpError::InternalError(message));
        }
    };

    metrics::record_tool_call(tool_label, "ok");

    let result = ToolsCallResult::json(&value).map_err(|e| McpError::InternalError(e.to_string()))?;
    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}
