//! REST handlers for sessions and their players

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use cadence_core::{NodeStats, ResumePolicy, SessionContext};
use cadence_plugin_api::{ContextError, GuildId, PlayerHandle, SessionId, SocketContext};

use crate::AppState;
use crate::error::ServerError;

/// Public view of one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub guild_id: GuildId,
    pub playing: bool,
}

impl From<&PlayerHandle> for PlayerInfo {
    fn from(handle: &PlayerHandle) -> Self {
        Self {
            guild_id: handle.guild_id(),
            playing: handle.is_playing(),
        }
    }
}

/// Body of `PATCH /v4/sessions/:session_id`
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SessionUpdate {
    pub resuming: Option<bool>,
    /// Grace window in seconds
    pub timeout: Option<u64>,
}

/// Effective resume settings of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub resuming: bool,
    pub timeout: u64,
}

impl From<ResumePolicy> for SessionInfo {
    fn from(policy: ResumePolicy) -> Self {
        Self {
            resuming: policy.enabled,
            timeout: policy.timeout.as_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: NodeStats,
    pub uptime_seconds: i64,
}

fn session(state: &AppState, session_id: SessionId) -> Result<Arc<SessionContext>, ServerError> {
    state
        .controller
        .find(session_id)
        .ok_or_else(|| ContextError::SessionNotFound(session_id).into())
}

/// GET /v4/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        stats: state.controller.stats(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// PATCH /v4/sessions/:session_id - change how the session survives disconnects
pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    Json(update): Json<SessionUpdate>,
) -> Result<Json<SessionInfo>, ServerError> {
    let session = session(&state, session_id)?;

    let mut policy = session.resume_policy().await;
    if let Some(resuming) = update.resuming {
        policy.enabled = resuming;
    }
    if let Some(timeout) = update.timeout {
        policy.timeout = Duration::from_secs(timeout);
    }
    session.set_resume_policy(policy).await;

    Ok(Json(policy.into()))
}

/// GET /v4/sessions/:session_id/players
pub async fn list_players(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<Vec<PlayerInfo>>, ServerError> {
    let session = session(&state, session_id)?;

    let mut players: Vec<PlayerInfo> = session.players().values().map(PlayerInfo::from).collect();
    players.sort_by_key(|player| player.guild_id);
    Ok(Json(players))
}

/// PATCH /v4/sessions/:session_id/players/:guild_id - get or create the player
pub async fn update_player(
    State(state): State<Arc<AppState>>,
    Path((session_id, guild_id)): Path<(SessionId, GuildId)>,
) -> Result<Json<PlayerInfo>, ServerError> {
    let session = session(&state, session_id)?;
    let handle = session.player(guild_id).await?;
    Ok(Json(PlayerInfo::from(&handle)))
}

/// DELETE /v4/sessions/:session_id/players/:guild_id
pub async fn destroy_player(
    State(state): State<Arc<AppState>>,
    Path((session_id, guild_id)): Path<(SessionId, GuildId)>,
) -> Result<StatusCode, ServerError> {
    let session = session(&state, session_id)?;
    session.destroy_player(guild_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
