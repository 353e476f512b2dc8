//! agent-gateway
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ request id ─▶ trace ─▶ timeout ─▶ client IP ─▶ body guard
//!                                                              │
//!          ┌───────────────────────────────────────────────────┘
//!          ▼
//!   /health ─────────────────────────────────────────▶ liveness JSON
//!   other  ─▶ general tier (100 / 15 min) ─┐
//!   /api/* ────────────────────────────────┴▶ API tier (50 / 15 min)
//!                                              ─▶ API key auth
//!                                              ─▶ agents / selection / vision proxy
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use agent_gateway::config::load_config;
use agent_gateway::lifecycle::signals::spawn_signal_handler;
use agent_gateway::observability::{logging, metrics};
use agent_gateway::{GatewayServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "agent-gateway", version, about = "Agent coordination gateway")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("agent-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        trusted_hops = config.proxy.trusted_hops,
        auth_configured = config.auth.api_key.is_some(),
        debug_endpoints = config.debug.enabled,
        vision_configured = config.vision.endpoint.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = GatewayServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
