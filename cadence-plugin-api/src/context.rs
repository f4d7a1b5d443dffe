//! SocketContext - a plugin's view of one client connection

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ContextError;
use crate::player::PlayerHandle;
use crate::types::{CloseFrame, ContextState, GuildId, SessionId, UserId};

/// Represents a WebSocket connection and the players it owns.
///
/// The node implements this for every session. Plugins receive it through
/// [`SessionEventHandler`](crate::SessionEventHandler) callbacks and use it to
/// look up players, talk to the client and close the socket.
#[async_trait]
pub trait SocketContext: Send + Sync {
    fn session_id(&self) -> SessionId;

    /// User id of the client
    fn user_id(&self) -> UserId;

    /// Name of the client, if it sent one
    fn client_name(&self) -> Option<&str>;

    fn state(&self) -> ContextState;

    /// Returns the player of a guild, creating it on first use.
    ///
    /// Fails with [`ContextError::SessionDestroyed`] once the context is
    /// destroyed and with [`ContextError::PlayerConstruction`] when the audio
    /// pipeline cannot build the player.
    async fn player(&self, guild_id: GuildId) -> Result<PlayerHandle, ContextError>;

    /// Snapshot of all players by guild. Later changes are not reflected.
    fn players(&self) -> HashMap<GuildId, PlayerHandle>;

    /// Releases the player of a guild. Does nothing if there is none.
    async fn destroy_player(&self, guild_id: GuildId) -> Result<(), ContextError>;

    /// Sends a JSON message to the client
    fn send_message(&self, message: serde_json::Value) -> Result<(), ContextError>;

    /// Closes the WebSocket, optionally with a close code and reason
    async fn close_websocket(&self, frame: Option<CloseFrame>);
}

/// Typed helpers on top of [`SocketContext`]
pub trait SocketContextExt: SocketContext {
    /// Serializes any `Serialize` value and sends it to the client
    fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<(), ContextError> {
        let value = serde_json::to_value(message)?;
        self.send_message(value)
    }
}

impl<C: SocketContext + ?Sized> SocketContextExt for C {}
