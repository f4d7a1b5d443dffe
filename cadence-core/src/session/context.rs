//! SessionContext - one client connection and everything it owns
//!
//! State changes are serialized through the session's lifecycle lock: the
//! controller takes it exclusively for transitions, player creation and
//! removal take it shared. A session that reached `Destroyed` therefore never
//! grows a new player.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockWriteGuard, watch};
use tokio::task::JoinHandle;

use cadence_plugin_api::{
    CloseFrame, ContextError, ContextState, GuildId, PlayerFactory, PlayerHandle, SessionId,
    SocketContext, UserId,
};

use super::dispatcher::MessageDispatcher;
use super::lifecycle::LifecycleController;
use super::players::PlayerDirectory;
use super::registry::ConnectionRegistry;
use crate::config::{ResumePolicy, SessionConfig};
use crate::events::EventEmitter;

/// Mutable lifecycle data guarded by the session lock
pub(crate) struct Lifecycle {
    pub(crate) policy: ResumePolicy,
    /// Bumped on every pause so stale resume timers can tell they are stale
    pub(crate) pause_epoch: u64,
    pub(crate) resume_timer: Option<JoinHandle<()>>,
}

/// A client session: identity, state, players and outbound channel
pub struct SessionContext {
    session_id: SessionId,
    user_id: UserId,
    client_name: Option<String>,
    pub(crate) lifecycle: RwLock<Lifecycle>,
    state: watch::Sender<ContextState>,
    pub(crate) players: PlayerDirectory,
    pub(crate) dispatcher: MessageDispatcher,
    emitter: EventEmitter,
    controller: Weak<LifecycleController>,
}

impl SessionContext {
    pub(crate) fn new(
        session_id: SessionId,
        user_id: UserId,
        client_name: Option<String>,
        config: &SessionConfig,
        factory: Arc<dyn PlayerFactory>,
        emitter: EventEmitter,
        controller: Weak<LifecycleController>,
    ) -> Self {
        let (state, state_rx) = watch::channel(ContextState::Open);
        Self {
            session_id,
            user_id,
            client_name,
            lifecycle: RwLock::new(Lifecycle {
                policy: config.resume_policy(),
                pause_epoch: 0,
                resume_timer: None,
            }),
            state,
            players: PlayerDirectory::new(session_id, factory),
            dispatcher: MessageDispatcher::new(session_id, config.queue_capacity(), state_rx),
            emitter,
            controller,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    pub fn state(&self) -> ContextState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change
    pub fn watch_state(&self) -> watch::Receiver<ContextState> {
        self.state.subscribe()
    }

    /// Id of the currently attached transport
    pub fn attachment(&self) -> Option<u64> {
        self.dispatcher.attachment()
    }

    pub async fn resume_policy(&self) -> ResumePolicy {
        self.lifecycle.read().await.policy
    }

    /// Change the resume policy; it applies the next time the socket is lost
    pub async fn set_resume_policy(&self, policy: ResumePolicy) {
        self.lifecycle.write().await.policy = policy;
        tracing::debug!(
            session_id = %self.session_id,
            enabled = policy.enabled,
            timeout_secs = policy.timeout.as_secs(),
            "Resume policy updated"
        );
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Players that are currently playing a track
    pub fn playing_players(&self) -> Vec<PlayerHandle> {
        self.players
            .snapshot()
            .into_values()
            .filter(|handle| handle.is_playing())
            .collect()
    }

    pub(crate) fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    pub(crate) fn set_state(&self, state: ContextState) {
        let previous = self.state.send_replace(state);
        tracing::debug!(
            session_id = %self.session_id,
            from = %previous,
            to = %state,
            "Session state changed"
        );
    }

    /// Release everything the session holds and enter `Destroyed`.
    ///
    /// Consumes the lifecycle write guard. The transport is detached and the
    /// players drained before the session leaves `registry`, and `Destroyed`
    /// is published last, so whoever observes it sees an empty, unregistered
    /// session. Returns the released players so the caller can report them
    /// once the lock is gone.
    pub(crate) async fn teardown(
        &self,
        mut lifecycle: RwLockWriteGuard<'_, Lifecycle>,
        frame: Option<CloseFrame>,
        registry: Option<&ConnectionRegistry>,
    ) -> Vec<PlayerHandle> {
        if let Some(timer) = lifecycle.resume_timer.take() {
            timer.abort();
        }
        if let Some(link) = self.dispatcher.detach() {
            link.close(frame);
        }
        let released = self.players.drain().await;
        if let Some(registry) = registry {
            registry.remove(self.session_id);
        }
        self.set_state(ContextState::Destroyed);
        drop(lifecycle);
        released
    }

    pub(crate) fn report_teardown(&self, released: &[PlayerHandle]) {
        for handle in released {
            self.emitter.destroy_player(self, handle);
        }
        self.emitter.session_destroyed(self);
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("state", &self.state())
            .finish()
    }
}

#[async_trait]
impl SocketContext for SessionContext {
    fn session_id(&self) -> SessionId {
        self.session_id
    }

    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    fn state(&self) -> ContextState {
        SessionContext::state(self)
    }

    async fn player(&self, guild_id: GuildId) -> Result<PlayerHandle, ContextError> {
        let (handle, created) = {
            let _lifecycle = self.lifecycle.read().await;
            if self.state().is_destroyed() {
                return Err(ContextError::SessionDestroyed(self.session_id));
            }
            self.players.get_or_create(guild_id).await?
        };

        if created {
            self.emitter.new_player(self, &handle);
        }
        Ok(handle)
    }

    fn players(&self) -> HashMap<GuildId, PlayerHandle> {
        self.players.snapshot()
    }

    async fn destroy_player(&self, guild_id: GuildId) -> Result<(), ContextError> {
        let removed = {
            let _lifecycle = self.lifecycle.read().await;
            if self.state().is_destroyed() {
                return Err(ContextError::SessionDestroyed(self.session_id));
            }
            self.players.remove(guild_id).await
        };

        if let Some(handle) = removed {
            self.emitter.destroy_player(self, &handle);
        }
        Ok(())
    }

    fn send_message(&self, message: serde_json::Value) -> Result<(), ContextError> {
        let payload = self.dispatcher.send(&message)?;
        self.emitter.message_out(self, &payload);
        Ok(())
    }

    async fn close_websocket(&self, frame: Option<CloseFrame>) {
        let Some(attachment) = self.dispatcher.close_transport(frame) else {
            tracing::debug!(session_id = %self.session_id, "No transport to close");
            return;
        };

        match self.controller.upgrade() {
            Some(controller) => {
                controller
                    .on_transport_closed(self.session_id, attachment)
                    .await;
            }
            None => {
                // No controller left to apply a resume policy
                let lifecycle = self.lifecycle.write().await;
                if self.state().is_destroyed() {
                    return;
                }
                let released = self.teardown(lifecycle, None, None).await;
                self.report_teardown(&released);
            }
        }
    }
}
