//! Player factory used when no audio pipeline is attached
//!
//! Players exist as bookkeeping only: they never play and release instantly.

use std::sync::Arc;

use async_trait::async_trait;

use cadence_plugin_api::{GuildId, Player, PlayerError, PlayerFactory, SessionId};

pub struct SilentPlayer {
    guild_id: GuildId,
}

impl Player for SilentPlayer {
    fn guild_id(&self) -> GuildId {
        self.guild_id
    }
}

/// Builds [`SilentPlayer`]s
#[derive(Debug, Default)]
pub struct SilentPlayerFactory;

#[async_trait]
impl PlayerFactory for SilentPlayerFactory {
    async fn create(
        &self,
        session_id: SessionId,
        guild_id: GuildId,
    ) -> Result<Arc<dyn Player>, PlayerError> {
        tracing::trace!(session_id = %session_id, guild_id = %guild_id, "Creating silent player");
        Ok(Arc::new(SilentPlayer { guild_id }))
    }

    async fn destroy(&self, player: Arc<dyn Player>) -> Result<(), PlayerError> {
        tracing::trace!(guild_id = %player.guild_id(), "Releasing silent player");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn silent_players_never_play() {
        let factory = SilentPlayerFactory;
        let player = factory.create(SessionId(1), GuildId(2)).await.unwrap();

        assert_eq!(player.guild_id(), GuildId(2));
        assert!(!player.is_playing());
        assert!(factory.destroy(player).await.is_ok());
    }
}
