//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, SESSION_ID};
//!
//! #[tokio::test]
//! async fn test_ping() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::authenticated(server.base_url.clone());
//!
//!     let reply = client.rpc("ping", None, SESSION_ID).await;
//!     assert!(reply["result"].is_object());
//! }
//! ```

mod client;
mod constants;
mod mock_erp;
mod server;

// Public API - this is what tests import
pub use client::{forge_token, TestClient};
pub use constants::*;
#[allow(unused_imports)]
pub use mock_erp::{MockErp, RecordedForm};
pub use server::TestServer;
