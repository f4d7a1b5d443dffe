//! Shared test utilities for cadence-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cadence_core::SessionConfig;
use cadence_core::mock::MockPlayerFactory;
use cadence_plugin_api::{ContextState, SessionId};
use cadence_server::{AppState, CadenceServer, ServerConfig};
use tokio::net::TcpListener;

/// Creates a test server with default session config
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, Arc<MockPlayerFactory>, SocketAddr) {
    create_test_server_with_sessions(SessionConfig::default()).await
}

/// Creates a test server whose sessions can be resumed
#[allow(dead_code)]
pub async fn create_resuming_server(
    timeout_secs: u64,
) -> (Arc<AppState>, Arc<MockPlayerFactory>, SocketAddr) {
    create_test_server_with_sessions(SessionConfig {
        resuming: true,
        resume_timeout_secs: timeout_secs,
        ..SessionConfig::default()
    })
    .await
}

/// Creates a test server with custom session config
pub async fn create_test_server_with_sessions(
    sessions: SessionConfig,
) -> (Arc<AppState>, Arc<MockPlayerFactory>, SocketAddr) {
    let (state, factory) = AppState::new_for_testing(sessions);
    let state = Arc::new(state);

    let server = CadenceServer::with_state(ServerConfig::default(), Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, factory, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: CadenceServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(Duration::from_millis(10)).await;

    addr
}

/// Wait until a session reaches `expected`, failing after a second
#[allow(dead_code)]
pub async fn wait_for_state(state: &AppState, session_id: SessionId, expected: ContextState) {
    let session = state
        .controller
        .find(session_id)
        .expect("session should be registered");
    let mut rx = session.watch_state();
    tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| *s == expected))
        .await
        .expect("timed out waiting for session state")
        .expect("state channel closed");
}
