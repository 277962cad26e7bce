use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub enable_debug_routes: Option<bool>,

    pub upstream: Option<UpstreamConfig>,
    pub mcp: Option<McpConfig>,
    pub auth: Option<AuthConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: Option<String>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct McpConfig {
    pub keepalive_interval_sec: Option<u64>,
    pub session_ttl_sec: Option<u64>,
    pub max_sessions: Option<usize>,
    pub session_cleanup_interval_sec: Option<u64>,
    pub allowed_origins: Option<Vec<String>>,
    pub capabilities: Option<CapabilitiesFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CapabilitiesFileConfig {
    pub tools: Option<bool>,
    pub resources: Option<bool>,
    pub prompts: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HS256 secret. Tokens are decoded without verification when absent.
    pub jwt_secret: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
