//! End-to-end tests for the HTTP transport
//!
//! Tests authentication, origin checks, body validation, the keep-alive
//! stream and session ownership.

mod common;

use common::{
    forge_token, TestClient, TestServer, ALLOWED_ORIGIN, ERP_TOKEN_B, FOREIGN_ORIGIN, SESSION_ID,
    TENANT_A, TENANT_B,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

fn ping() -> Value {
    json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.post_mcp(&ping(), SESSION_ID).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = TestClient::with_token(server.base_url.clone(), "not-a-jwt".to_string());

    let response = client.post_mcp(&ping(), SESSION_ID).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_without_erp_credential_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = TestClient::as_tenant(server.base_url.clone(), TENANT_A, "");

    let response = client.post_mcp(&ping(), SESSION_ID).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("tiny_token"));
}

#[tokio::test]
async fn test_foreign_origin_is_forbidden() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone());

    let response = client.post_mcp_from_origin(&ping(), FOREIGN_ORIGIN).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_foreign_origin_is_checked_before_auth() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.post_mcp_from_origin(&ping(), FOREIGN_ORIGIN).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_allowed_origin_passes() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone());

    let response = client.post_mcp_from_origin(&ping(), ALLOWED_ORIGIN).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_origin_list_allows_everything() {
    let server = TestServer::spawn_with(|config| config.allowed_origins.clear()).await;
    let client = TestClient::authenticated(server.base_url.clone());

    let response = client.post_mcp_from_origin(&ping(), FOREIGN_ORIGIN).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone());

    let response = client.post_mcp_raw("{\"jsonrpc\":", Some(SESSION_ID)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid JSON");
}

#[tokio::test]
async fn test_non_object_body_is_bad_request() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone());

    let response = client.post_mcp_raw("[1, 2, 3]", Some(SESSION_ID)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stream_sends_keepalive_immediately() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone());

    let mut response = client.open_stream().await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert_eq!(response.headers()["cache-control"], "no-cache");
    assert_eq!(response.headers()["x-accel-buffering"], "no");

    let chunk = tokio::time::timeout(Duration::from_secs(2), response.chunk())
        .await
        .expect("No keep-alive event received")
        .unwrap()
        .unwrap();
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.starts_with("data: "));
    assert!(text.contains("\"type\":\"keepalive\""));
    assert!(text.contains("\"timestamp\""));
}

#[tokio::test]
async fn test_stream_requires_token() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.open_stream().await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_of_another_tenant_is_forbidden() {
    let server = TestServer::spawn().await;
    let owner = TestClient::authenticated(server.base_url.clone());
    let intruder = TestClient::as_tenant(server.base_url.clone(), TENANT_B, ERP_TOKEN_B);

    owner.initialize(SESSION_ID).await;
    let response = intruder.post_mcp(&ping(), SESSION_ID).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_session_keeps_the_credential_it_was_created_with() {
    let server = TestServer::spawn().await;
    let first = TestClient::authenticated(server.base_url.clone());
    let rotated = TestClient::with_token(
        server.base_url.clone(),
        forge_token(TENANT_A, "rotated-erp-token"),
    );

    first.initialize(SESSION_ID).await;
    rotated
        .call_tool("tiny_pedido_obter", json!({"id": "1"}), SESSION_ID)
        .await;

    let form = server.erp.last_received();
    assert_eq!(form.field("token"), Some(common::ERP_TOKEN_A));
}

#[tokio::test]
async fn test_delete_terminates_session() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone());

    client.initialize(SESSION_ID).await;

    let response = client.delete_session(Some(SESSION_ID)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client.delete_session(Some(SESSION_ID)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_requires_session_header() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone());

    let response = client.delete_session(None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_of_foreign_session_is_forbidden() {
    let server = TestServer::spawn().await;
    let owner = TestClient::authenticated(server.base_url.clone());
    let intruder = TestClient::as_tenant(server.base_url.clone(), TENANT_B, ERP_TOKEN_B);

    owner.initialize(SESSION_ID).await;
    let response = intruder.delete_session(Some(SESSION_ID)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_is_public() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "mcp-tiny-erp-server");
}
