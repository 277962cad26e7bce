//! Shared test constants

#![allow(dead_code)]

pub const TENANT_A: &str = "loja-a";
pub const TENANT_A_NAME: &str = "Loja A";
pub const ERP_TOKEN_A: &str = "erp-token-a";

pub const TENANT_B: &str = "loja-b";
pub const ERP_TOKEN_B: &str = "erp-token-b";

pub const SESSION_ID: &str = "e2e-session-1";

pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";
pub const FOREIGN_ORIGIN: &str = "https://evil.example.com";

pub const REQUEST_TIMEOUT_SECS: u64 = 5;
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

pub const TOOL_COUNT: usize = 77;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
