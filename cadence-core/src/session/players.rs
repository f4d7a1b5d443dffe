//! PlayerDirectory - lazily created players of one session
//!
//! Each guild gets a slot guarded by its own async mutex. The first caller to
//! lock an empty slot builds the player; everyone queued behind it finds the
//! finished handle. Removal retires the slot under the same lock, so a caller
//! that was waiting on it starts over with a fresh slot instead of reviving a
//! released player.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use cadence_plugin_api::{ContextError, GuildId, PlayerFactory, PlayerHandle, SessionId};

enum SlotState {
    Empty,
    Ready(PlayerHandle),
    Retired,
}

type Slot = Arc<Mutex<SlotState>>;

/// Per-session map from guild to player handle
pub struct PlayerDirectory {
    session_id: SessionId,
    factory: Arc<dyn PlayerFactory>,
    slots: DashMap<GuildId, Slot>,
    /// Handles of fully built players; what lookups and snapshots see
    players: DashMap<GuildId, PlayerHandle>,
}

impl PlayerDirectory {
    pub fn new(session_id: SessionId, factory: Arc<dyn PlayerFactory>) -> Self {
        Self {
            session_id,
            factory,
            slots: DashMap::new(),
            players: DashMap::new(),
        }
    }

    /// Return the guild's player, building it if needed.
    ///
    /// The flag is true when this call constructed the player.
    pub async fn get_or_create(
        &self,
        guild_id: GuildId,
    ) -> Result<(PlayerHandle, bool), ContextError> {
        if let Some(handle) = self.players.get(&guild_id) {
            return Ok((handle.clone(), false));
        }

        loop {
            let slot = self
                .slots
                .entry(guild_id)
                .or_insert_with(|| Arc::new(Mutex::new(SlotState::Empty)))
                .clone();
            let mut state = slot.lock().await;

            match &*state {
                SlotState::Ready(handle) => return Ok((handle.clone(), false)),
                // Removed while we waited; the map already points elsewhere
                SlotState::Retired => continue,
                SlotState::Empty => {}
            }

            let player = match self.factory.create(self.session_id, guild_id).await {
                Ok(player) => player,
                Err(source) => {
                    // Nothing was built; don't keep a slot around for this guild
                    *state = SlotState::Retired;
                    self.slots.remove_if(&guild_id, |_, current| Arc::ptr_eq(current, &slot));
                    return Err(ContextError::PlayerConstruction { guild_id, source });
                }
            };

            let handle = PlayerHandle::new(self.session_id, guild_id, player);
            *state = SlotState::Ready(handle.clone());
            self.players.insert(guild_id, handle.clone());

            tracing::debug!(
                session_id = %self.session_id,
                guild_id = %guild_id,
                instance = handle.instance(),
                "Player created"
            );
            return Ok((handle, true));
        }
    }

    /// Look up a player without creating it
    pub fn get(&self, guild_id: GuildId) -> Option<PlayerHandle> {
        self.players.get(&guild_id).map(|handle| handle.clone())
    }

    /// Release the guild's player and forget it.
    ///
    /// The handle is unpublished first, then released through the factory,
    /// and only then is the slot dropped. Release errors are logged.
    pub async fn remove(&self, guild_id: GuildId) -> Option<PlayerHandle> {
        let slot = self.slots.get(&guild_id).map(|slot| slot.clone())?;
        let mut state = slot.lock().await;

        let handle = match std::mem::replace(&mut *state, SlotState::Retired) {
            SlotState::Ready(handle) => Some(handle),
            SlotState::Empty | SlotState::Retired => None,
        };

        if let Some(handle) = &handle {
            self.players.remove(&guild_id);
            self.release(handle).await;
        }

        self.slots.remove_if(&guild_id, |_, current| Arc::ptr_eq(current, &slot));
        drop(state);

        handle
    }

    /// Remove and release every player, continuing past failures
    pub async fn drain(&self) -> Vec<PlayerHandle> {
        let guilds: Vec<GuildId> = self.slots.iter().map(|entry| *entry.key()).collect();

        let mut released = Vec::with_capacity(guilds.len());
        for guild_id in guilds {
            if let Some(handle) = self.remove(guild_id).await {
                released.push(handle);
            }
        }
        released
    }

    /// Copy of the current guild to player mapping
    pub fn snapshot(&self) -> HashMap<GuildId, PlayerHandle> {
        self.players
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Number of players currently playing a track
    pub fn playing_count(&self) -> usize {
        self.players
            .iter()
            .filter(|entry| entry.value().is_playing())
            .count()
    }

    async fn release(&self, handle: &PlayerHandle) {
        match self.factory.destroy(handle.player().clone()).await {
            Ok(()) => {
                tracing::debug!(
                    session_id = %self.session_id,
                    guild_id = %handle.guild_id(),
                    "Player released"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    guild_id = %handle.guild_id(),
                    error = %e,
                    "Failed to release player, continuing"
                );
            }
        }
    }
}
