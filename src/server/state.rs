use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use super::auth::ClaimsVerifier;
use super::ServerConfig;
use crate::mcp::handler::McpState;

pub type GuardedMcpState = Arc<McpState>;
pub type GuardedClaimsVerifier = Arc<dyn ClaimsVerifier>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub mcp_state: GuardedMcpState,
    pub claims_verifier: GuardedClaimsVerifier,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        mcp_state: GuardedMcpState,
        claims_verifier: GuardedClaimsVerifier,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            mcp_state,
            claims_verifier,
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedMcpState {
    fn from_ref(input: &ServerState) -> Self {
        input.mcp_state.clone()
    }
}
