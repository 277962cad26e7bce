mod file_config;

pub use file_config::{AuthConfig, CapabilitiesFileConfig, FileConfig, McpConfig, UpstreamConfig};

use crate::server::{CapabilitiesConfig, RequestsLoggingLevel, ServerConfig, DEFAULT_ALLOWED_ORIGINS};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::time::Duration;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.tiny.com.br/api2";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub port: u16,
    pub bind_address: String,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub upstream_base_url: String,
    pub upstream_timeout_sec: u64,
    pub jwt_secret: Option<String>,
    pub enable_debug_routes: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            upstream_timeout_sec: 30,
            jwt_secret: None,
            enable_debug_routes: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub bind_address: String,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub enable_debug_routes: bool,

    pub upstream: UpstreamSettings,
    pub mcp: McpSettings,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct McpSettings {
    pub keepalive_interval_sec: u64,
    pub session_ttl_sec: u64,
    pub max_sessions: usize,
    pub session_cleanup_interval_sec: u64,
    pub allowed_origins: Vec<String>,
    pub capabilities: CapabilitiesConfig,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            keepalive_interval_sec: 30,
            session_ttl_sec: 3600,
            max_sessions: 10_000,
            session_cleanup_interval_sec: 300,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            capabilities: CapabilitiesConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let bind_address = file
            .bind_address
            .unwrap_or_else(|| cli.bind_address.clone());
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = match file.logging_level {
            Some(level) => match parse_logging_level(&level) {
                Some(level) => level,
                None => bail!("Invalid logging_level in config file: {:?}", level),
            },
            None => cli.logging_level.clone(),
        };

        let enable_debug_routes = file
            .enable_debug_routes
            .unwrap_or(cli.enable_debug_routes);

        let upstream_file = file.upstream.unwrap_or_default();
        let upstream = UpstreamSettings {
            base_url: upstream_file
                .base_url
                .unwrap_or_else(|| cli.upstream_base_url.clone())
                .trim_end_matches('/')
                .to_string(),
            timeout_sec: upstream_file.timeout_sec.unwrap_or(cli.upstream_timeout_sec),
        };
        if !upstream.base_url.starts_with("http://") && !upstream.base_url.starts_with("https://")
        {
            bail!("upstream base_url must be an http(s) URL: {:?}", upstream.base_url);
        }
        if upstream.timeout_sec == 0 {
            bail!("upstream timeout_sec must be greater than zero");
        }

        // MCP settings - merge file config with defaults
        let defaults = McpSettings::default();
        let mcp_file = file.mcp.unwrap_or_default();
        let caps_file = mcp_file.capabilities.unwrap_or_default();
        let mcp = McpSettings {
            keepalive_interval_sec: mcp_file
                .keepalive_interval_sec
                .unwrap_or(defaults.keepalive_interval_sec),
            session_ttl_sec: mcp_file.session_ttl_sec.unwrap_or(defaults.session_ttl_sec),
            max_sessions: mcp_file.max_sessions.unwrap_or(defaults.max_sessions),
            session_cleanup_interval_sec: mcp_file
                .session_cleanup_interval_sec
                .unwrap_or(defaults.session_cleanup_interval_sec),
            allowed_origins: mcp_file.allowed_origins.unwrap_or(defaults.allowed_origins),
            capabilities: CapabilitiesConfig {
                tools: caps_file.tools.unwrap_or(defaults.capabilities.tools),
                resources: caps_file.resources.unwrap_or(defaults.capabilities.resources),
                prompts: caps_file.prompts.unwrap_or(defaults.capabilities.prompts),
            },
        };
        if mcp.keepalive_interval_sec == 0 {
            bail!("mcp keepalive_interval_sec must be greater than zero");
        }
        if mcp.session_cleanup_interval_sec == 0 {
            bail!("mcp session_cleanup_interval_sec must be greater than zero");
        }
        if mcp.max_sessions == 0 {
            bail!("mcp max_sessions must be greater than zero");
        }

        // TOML [auth] section takes precedence over the CLI secret
        let jwt_secret = file
            .auth
            .and_then(|auth| auth.jwt_secret)
            .or_else(|| cli.jwt_secret.clone())
            .filter(|secret| !secret.is_empty());

        Ok(Self {
            port,
            bind_address,
            metrics_port,
            logging_level,
            enable_debug_routes,
            upstream,
            mcp,
            jwt_secret,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            bind_address: self.bind_address.clone(),
            port: self.port,
            keepalive_interval: Duration::from_secs(self.mcp.keepalive_interval_sec),
            allowed_origins: self.mcp.allowed_origins.clone(),
            capabilities: self.mcp.capabilities.clone(),
            enable_debug_routes: self.enable_debug_routes,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.mcp.session_ttl_sec)
    }

    pub fn session_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.mcp.session_cleanup_interval_sec)
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
