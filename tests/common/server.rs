//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated gateway wired to its own mock ERP.

use super::constants::*;
use super::mock_erp::MockErp;
use std::sync::Arc;
use std::time::Duration;
use tiny_mcp_gateway::erp::HttpTransport;
use tiny_mcp_gateway::mcp::{create_mcp_state, InMemorySessionStore, McpRegistry, SessionManager};
use tiny_mcp_gateway::server::auth::UnverifiedClaimsDecoder;
use tiny_mcp_gateway::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use tokio::net::TcpListener;

/// Test gateway instance with its own mock ERP
///
/// When dropped, both servers gracefully shut down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    #[allow(dead_code)]
    pub port: u16,

    /// Upstream stand-in receiving the form POSTs
    #[allow(dead_code)]
    pub erp: MockErp,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

#[allow(dead_code)]
impl TestServer {
    /// Spawns a gateway with the default configuration on a random port
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawns a gateway after letting the caller adjust its configuration
    ///
    /// # Panics
    ///
    /// Panics if port binding fails or the server doesn't become ready within timeout
    pub async fn spawn_with(configure: impl FnOnce(&mut ServerConfig)) -> Self {
        let erp = MockErp::spawn().await;

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let mut config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            keepalive_interval: Duration::from_millis(200),
            ..ServerConfig::default()
        };
        configure(&mut config);

        let transport = Arc::new(
            HttpTransport::new(&erp.base_url, REQUEST_TIMEOUT_SECS)
                .expect("Failed to build upstream transport"),
        );
        let sessions = Arc::new(SessionManager::new(Arc::new(InMemorySessionStore::new(
            Duration::from_secs(600),
            1000,
        ))));
        let mcp_state = create_mcp_state(
            Arc::new(McpRegistry::with_all_tools().expect("Invalid tool catalog")),
            sessions,
            transport,
            config.capabilities.to_server_capabilities(),
            "test".to_string(),
        );
        let state = ServerState::new(config, Arc::new(mcp_state), Arc::new(UnverifiedClaimsDecoder));
        let app = make_app(state);

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            erp,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the /health endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/health", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
