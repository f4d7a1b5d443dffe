//! Errors returned through the socket context

use thiserror::Error;

use crate::player::PlayerError;
use crate::types::{ContextState, GuildId, SessionId};

/// Errors that operations on a socket context can return
#[derive(Error, Debug)]
pub enum ContextError {
    /// A session with this id is already registered
    #[error("session {0} is already registered")]
    DuplicateSession(SessionId),

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session is terminal; treat it as gone
    #[error("session {0} has been destroyed")]
    SessionDestroyed(SessionId),

    /// No transport is attached to write to
    #[error("session {session_id} is not connected (state {state})")]
    NotConnected {
        session_id: SessionId,
        state: ContextState,
    },

    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: ContextState, to: ContextState },

    /// The audio pipeline failed to build a player
    #[error("failed to create player for guild {guild_id}: {source}")]
    PlayerConstruction {
        guild_id: GuildId,
        #[source]
        source: PlayerError,
    },

    /// The session's outbound queue is full; the message was dropped
    #[error("outbound queue of session {session_id} is full ({capacity} messages)")]
    OutboundQueueFull {
        session_id: SessionId,
        capacity: usize,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ContextError {
    /// True when the session can no longer be used at all
    pub fn is_session_gone(&self) -> bool {
        matches!(
            self,
            ContextError::SessionDestroyed(_) | ContextError::SessionNotFound(_)
        )
    }
}
