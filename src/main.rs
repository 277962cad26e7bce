use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tiny_mcp_gateway::config::{AppConfig, CliConfig, FileConfig, DEFAULT_UPSTREAM_BASE_URL};
use tiny_mcp_gateway::erp::{HttpTransport, UpstreamTransport};
use tiny_mcp_gateway::mcp::{create_mcp_state, InMemorySessionStore, McpRegistry, SessionManager};
use tiny_mcp_gateway::server::auth::{Hs256ClaimsVerifier, UnverifiedClaimsDecoder};
use tiny_mcp_gateway::server::state::GuardedClaimsVerifier;
use tiny_mcp_gateway::server::{
    metrics, run_metrics_server, run_server, RequestsLoggingLevel, ServerState,
};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI flags.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8000)]
    pub port: u16,

    /// The address to bind to.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind_address: String,

    /// The port for the metrics server (Prometheus scraping). 0 disables it.
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base URL of the Tiny ERP v2 API.
    #[clap(long, default_value = DEFAULT_UPSTREAM_BASE_URL)]
    pub upstream_base_url: String,

    /// Timeout in seconds for upstream requests.
    #[clap(long, default_value_t = 30)]
    pub upstream_timeout_sec: u64,

    /// Shared secret for HS256 token verification.
    #[clap(long)]
    pub jwt_secret: Option<String>,

    /// Expose the order encoding preview route.
    #[clap(long)]
    pub enable_debug_routes: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            port: self.port,
            bind_address: self.bind_address.clone(),
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            upstream_base_url: self.upstream_base_url.clone(),
            upstream_timeout_sec: self.upstream_timeout_sec,
            jwt_secret: self.jwt_secret.clone(),
            enable_debug_routes: self.enable_debug_routes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Initializing metrics...");
    metrics::init_metrics();

    let registry = Arc::new(McpRegistry::with_all_tools().context("Invalid tool catalog")?);

    info!("Upstream ERP at {}", config.upstream.base_url);
    let transport: Arc<dyn UpstreamTransport> = Arc::new(
        HttpTransport::new(&config.upstream.base_url, config.upstream.timeout_sec)
            .context("Failed to build upstream HTTP client")?,
    );

    let claims_verifier: GuardedClaimsVerifier = match &config.jwt_secret {
        Some(secret) => {
            info!("Verifying HS256 token signatures");
            Arc::new(Hs256ClaimsVerifier::new(secret))
        }
        None => {
            warn!("No jwt_secret configured, bearer tokens are decoded without signature verification");
            Arc::new(UnverifiedClaimsDecoder)
        }
    };

    let sessions = Arc::new(SessionManager::new(Arc::new(InMemorySessionStore::new(
        config.session_ttl(),
        config.mcp.max_sessions,
    ))));

    // Spawn background task for expired session cleanup
    {
        let sessions = sessions.clone();
        let interval = config.session_cleanup_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick, wait for the first interval
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = sessions.cleanup_expired().await;
                if removed > 0 {
                    info!("Removed {} expired sessions", removed);
                }
                metrics::set_active_sessions(sessions.active_sessions().await);
            }
        });
    }

    let server_version = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
    let server_config = config.server_config();
    let mcp_state = create_mcp_state(
        registry,
        sessions,
        transport,
        server_config.capabilities.to_server_capabilities(),
        server_version,
    );
    let state = ServerState::new(server_config, Arc::new(mcp_state), claims_verifier);

    if config.metrics_port > 0 {
        let metrics_port = config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = run_metrics_server(metrics_port).await {
                error!("Metrics server stopped: {}", e);
            }
        });
    }

    run_server(state).await
}
