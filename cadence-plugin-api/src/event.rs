//! Session lifecycle hooks for plugins

use crate::context::SocketContext;
use crate::player::PlayerHandle;

/// Receives session and player lifecycle events.
///
/// All handlers have default no-op implementations, so plugins only need to
/// override the ones they care about. Handlers run inline on the thread that
/// caused the event and must not block.
pub trait SessionEventHandler: Send + Sync {
    /// Called when a WebSocket is attached, either to a new session or to a
    /// resumed one
    fn on_session_opened(&self, _ctx: &dyn SocketContext, _resumed: bool) {}

    /// Called when the WebSocket went away but the session can be resumed
    fn on_session_paused(&self, _ctx: &dyn SocketContext) {}

    /// Called once the session is destroyed and all its players released
    fn on_session_destroyed(&self, _ctx: &dyn SocketContext) {}

    /// Called after a player is created for a guild
    fn on_new_player(&self, _ctx: &dyn SocketContext, _player: &PlayerHandle) {}

    /// Called after a player has been released
    fn on_destroy_player(&self, _ctx: &dyn SocketContext, _player: &PlayerHandle) {}

    /// Called for every payload queued towards the client
    fn on_message_out(&self, _ctx: &dyn SocketContext, _payload: &str) {}

    /// Called for every text message received from the client
    fn on_message_in(&self, _ctx: &dyn SocketContext, _payload: &str) {}
}
