//! cadence-server - HTTP and WebSocket host for the cadence node
//!
//! This crate owns the [`LifecycleController`](cadence_core::LifecycleController)
//! and exposes it to clients: a WebSocket per session plus a small REST API
//! for players and resume settings.

mod error;
pub mod http;
mod player;
mod state;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

pub use error::{ErrorResponse, ServerError};
pub use http::create_router;
pub use player::{SilentPlayer, SilentPlayerFactory};
pub use state::AppState;

/// Default address to bind to
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port to listen on
pub const DEFAULT_PORT: u16 = 2333;
/// Default interval between stats pushes to connected clients
pub const DEFAULT_STATS_INTERVAL_SECS: u64 = 60;

/// The main cadence server
pub struct CadenceServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl CadenceServer {
    /// Create a new server with default state
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(AppState::default()),
        }
    }

    /// Create a server with custom state (for testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("cadence server listening on {}", addr);
        self.run_with_listener(listener).await
    }

    /// Run the server on an already bound listener.
    ///
    /// Returns after Ctrl-C, once every session has been destroyed.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let stats_task = self.start_stats_broadcast();

        let router = create_router(Arc::clone(&self.state));
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        stats_task.abort();
        self.state.controller.shutdown().await;
        served.map_err(|e| ServerError::Internal(e.to_string()))
    }

    /// Start a background task that pushes node stats to every connected client
    fn start_stats_broadcast(&self) -> tokio::task::JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let period = self.config.stats_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let count = state.controller.broadcast_stats();
                tracing::trace!("Sent stats to {} sessions", count);
            }
        })
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// How often connected clients receive a stats message
    pub stats_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            stats_interval: Duration::from_secs(DEFAULT_STATS_INTERVAL_SECS),
        }
    }

    /// Returns the socket address string (e.g., "127.0.0.1:2333")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
