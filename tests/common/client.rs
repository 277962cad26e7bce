//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and speaks JSON-RPC to the gateway's `/mcp` endpoint.
//!
//! When routes or request formats change, update only this file.

use super::constants::*;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// Builds an unsigned bearer token carrying tenant claims.
pub fn forge_token(tenant_id: &str, tiny_token: &str) -> String {
    let payload = json!({
        "tenant_id": tenant_id,
        "tenant_nome": TENANT_A_NAME,
        "plano": "pro",
        "tiny_token": tiny_token,
    });
    format!(
        "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.unsigned",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// HTTP test client holding an optional bearer token
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    token: Option<String>,
}

#[allow(dead_code)]
impl TestClient {
    /// Creates a client that sends no Authorization header
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Creates a client authenticated as tenant A
    pub fn authenticated(base_url: String) -> Self {
        Self::as_tenant(base_url, TENANT_A, ERP_TOKEN_A)
    }

    pub fn as_tenant(base_url: String, tenant_id: &str, tiny_token: &str) -> Self {
        Self::with_token(base_url, forge_token(tenant_id, tiny_token))
    }

    pub fn with_token(base_url: String, token: String) -> Self {
        let mut client = Self::new(base_url);
        client.token = Some(token);
        client
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.request(reqwest::Method::GET, path)
            .send()
            .await
            .expect("GET request failed")
    }

    /// POST /mcp with a raw body and optional session header
    pub async fn post_mcp_raw(&self, body: &str, session_id: Option<&str>) -> Response {
        let mut builder = self
            .request(reqwest::Method::POST, "/mcp")
            .header("content-type", "application/json")
            .body(body.to_string());
        if let Some(id) = session_id {
            builder = builder.header("mcp-session-id", id);
        }
        builder.send().await.expect("POST /mcp failed")
    }

    pub async fn post_mcp(&self, message: &Value, session_id: &str) -> Response {
        self.post_mcp_raw(&message.to_string(), Some(session_id))
            .await
    }

    pub async fn post_mcp_from_origin(&self, message: &Value, origin: &str) -> Response {
        self.request(reqwest::Method::POST, "/mcp")
            .header("origin", origin)
            .json(message)
            .send()
            .await
            .expect("POST /mcp failed")
    }

    /// Sends a JSON-RPC request and returns the decoded reply
    pub async fn rpc(&self, method: &str, params: Option<Value>, session_id: &str) -> Value {
        let mut message = json!({"jsonrpc": "2.0", "id": 1, "method": method});
        if let Some(params) = params {
            message["params"] = params;
        }
        let response = self.post_mcp(&message, session_id).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Unexpected status for {}",
            method
        );
        response.json().await.expect("Reply is not JSON")
    }

    pub async fn initialize(&self, session_id: &str) -> Value {
        self.rpc(
            "initialize",
            Some(json!({
                "protocolVersion": "2025-06-18",
                "capabilities": {},
                "clientInfo": {"name": "e2e", "version": "1.0"}
            })),
            session_id,
        )
        .await
    }

    pub async fn list_tools(&self, session_id: &str) -> Value {
        self.rpc("tools/list", None, session_id).await
    }

    pub async fn call_tool(&self, name: &str, arguments: Value, session_id: &str) -> Value {
        self.rpc(
            "tools/call",
            Some(json!({"name": name, "arguments": arguments})),
            session_id,
        )
        .await
    }

    /// GET /mcp, the keep-alive event stream
    pub async fn open_stream(&self) -> Response {
        self.request(reqwest::Method::GET, "/mcp")
            .header("accept", "text/event-stream")
            .send()
            .await
            .expect("GET /mcp failed")
    }

    pub async fn delete_session(&self, session_id: Option<&str>) -> Response {
        let mut builder = self.request(reqwest::Method::DELETE, "/mcp");
        if let Some(id) = session_id {
            builder = builder.header("mcp-session-id", id);
        }
        builder.send().await.expect("DELETE /mcp failed")
    }
}
