//! Player contracts between the session core and the audio pipeline
//!
//! The node never looks inside a player. It asks a [`PlayerFactory`] to build
//! one the first time a guild is touched, hands it out wrapped in a
//! [`PlayerHandle`], and gives it back to the factory for release.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{GuildId, SessionId};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Errors raised by the audio pipeline while building or releasing a player
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The media connection for the guild could not be allocated
    #[error("media connection unavailable: {0}")]
    MediaConnection(String),

    /// Playback could not be stopped cleanly
    #[error("failed to stop playback: {0}")]
    Playback(String),

    #[error("{0}")]
    Custom(String),
}

impl PlayerError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// A per-guild audio player owned by the audio pipeline
pub trait Player: Send + Sync {
    /// Guild this player is bound to
    fn guild_id(&self) -> GuildId;

    /// Whether a track is currently playing
    fn is_playing(&self) -> bool {
        false
    }
}

/// Builds and releases players on behalf of a session.
///
/// `destroy` must stop playback and release the media connection. It is
/// called exactly once per player the factory created.
#[async_trait]
pub trait PlayerFactory: Send + Sync {
    async fn create(
        &self,
        session_id: SessionId,
        guild_id: GuildId,
    ) -> Result<Arc<dyn Player>, PlayerError>;

    async fn destroy(&self, player: Arc<dyn Player>) -> Result<(), PlayerError>;
}

/// Handle to the player of one (session, guild) pair.
///
/// Cloning is cheap and clones share identity. A handle built after the
/// previous player was destroyed carries a new [`instance`](Self::instance).
#[derive(Clone)]
pub struct PlayerHandle {
    session_id: SessionId,
    guild_id: GuildId,
    instance: u64,
    player: Arc<dyn Player>,
}

impl PlayerHandle {
    /// Wrap a freshly built player, assigning it a new instance number
    pub fn new(session_id: SessionId, guild_id: GuildId, player: Arc<dyn Player>) -> Self {
        Self {
            session_id,
            guild_id,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            player,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Process-unique number of the underlying player
    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn player(&self) -> &Arc<dyn Player> {
        &self.player
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    /// True when both handles point at the same player
    pub fn same_player(&self, other: &PlayerHandle) -> bool {
        self.instance == other.instance
    }
}

impl fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("session_id", &self.session_id)
            .field("guild_id", &self.guild_id)
            .field("instance", &self.instance)
            .finish()
    }
}
