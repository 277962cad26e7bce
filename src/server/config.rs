use std::time::Duration;

use super::RequestsLoggingLevel;
use crate::mcp::protocol::{
    PromptsCapability, ResourcesCapability, ServerCapabilities, ToolsCapability,
};

/// Origin fragments accepted by default on the MCP endpoint.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 5] = [
    ".railway.app",
    "localhost",
    "127.0.0.1",
    "gptmaker.ai",
    "claude.ai",
];

/// Capabilities announced by `initialize`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilitiesConfig {
    pub tools: bool,
    pub resources: bool,
    pub prompts: bool,
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            tools: true,
            resources: true,
            prompts: true,
        }
    }
}

impl CapabilitiesConfig {
    pub fn to_server_capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: self.tools.then_some(ToolsCapability {
                list_changed: false,
            }),
            resources: self.resources.then_some(ResourcesCapability {
                subscribe: false,
                list_changed: false,
            }),
            prompts: self.prompts.then_some(PromptsCapability {
                list_changed: false,
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub bind_address: String,
    pub port: u16,
    /// Interval between keep-alive events on `GET /mcp`.
    pub keepalive_interval: Duration,
    /// Substrings matched against the `Origin` header. Empty allows every origin.
    pub allowed_origins: Vec<String>,
    pub capabilities: CapabilitiesConfig,
    /// Enables `POST /debug/pedido/preview`.
    pub enable_debug_routes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            keepalive_interval: Duration::from_secs(30),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            capabilities: CapabilitiesConfig::default(),
            enable_debug_routes: false,
        }
    }
}
