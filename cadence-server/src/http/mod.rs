//! HTTP server module

mod sessions;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};

use crate::AppState;

pub use sessions::{PlayerInfo, SessionInfo, SessionUpdate, StatsResponse};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v4/websocket", get(crate::ws::websocket_handler))
        .route("/v4/stats", get(sessions::stats))
        .route("/v4/sessions/:session_id", patch(sessions::update_session))
        .route("/v4/sessions/:session_id/players", get(sessions::list_players))
        .route(
            "/v4/sessions/:session_id/players/:guild_id",
            patch(sessions::update_player).delete(sessions::destroy_player),
        )
        .with_state(state)
}
