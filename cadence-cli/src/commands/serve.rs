//! Serve command for running the node
//!
//! Binds the WebSocket endpoint and REST API and runs until Ctrl-C, then
//! destroys every remaining session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::info;

use cadence_server::{AppState, CadenceServer, ServerConfig};

use crate::config::CadenceConfig;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,
}

/// Run the serve command
pub async fn run(args: ServeArgs, config: CadenceConfig) -> Result<()> {
    let server_config = server_config(&args, &config);
    info!(
        "Starting cadence server on {}:{}",
        server_config.host, server_config.port
    );
    info!(
        resuming = config.sessions.resuming,
        resume_timeout_secs = config.sessions.resume_timeout_secs,
        "Session defaults"
    );

    let state = Arc::new(AppState::new(config.sessions));
    CadenceServer::with_state(server_config, state).run().await?;

    info!("cadence server stopped");
    Ok(())
}

/// Flags win over the loaded config
fn server_config(args: &ServeArgs, config: &CadenceConfig) -> ServerConfig {
    let mut server = ServerConfig::new(
        args.host.clone().unwrap_or_else(|| config.server.host.clone()),
        args.port.unwrap_or(config.server.port),
    );
    server.stats_interval = Duration::from_secs(config.server.stats_interval_secs.max(1));
    server
}
