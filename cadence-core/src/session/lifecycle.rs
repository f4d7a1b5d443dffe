//! LifecycleController - drives sessions through OPEN, RESUMABLE and DESTROYED
//!
//! ```text
//! OPEN ──transport lost, resuming on──▶ RESUMABLE ──grace expired──▶ DESTROYED
//!  ▲  │                                     │
//!  │  └──transport lost, resuming off──▶ DESTROYED ◀──destroy()
//!  └──────────────resume()──────────────────┘
//! ```
//!
//! Every transition holds the session's lifecycle lock exclusively. Grace
//! timers carry the pause epoch they were started in, so a timer that fires
//! after the session was resumed (and possibly paused again) does nothing.

use std::sync::{Arc, Weak};

use uuid::Uuid;

use cadence_plugin_api::{
    CloseFrame, ContextError, ContextState, PlayerFactory, PlayerHandle, SessionId,
    SocketContextExt, UserId,
};

use super::context::SessionContext;
use super::registry::ConnectionRegistry;
use crate::config::SessionConfig;
use crate::events::EventEmitter;
use crate::protocol::{NodeStats, ServerMessage};
use crate::transport::Transport;

/// Owns the transitions of every session in a registry
pub struct LifecycleController {
    this: Weak<LifecycleController>,
    registry: Arc<ConnectionRegistry>,
    factory: Arc<dyn PlayerFactory>,
    emitter: EventEmitter,
    config: SessionConfig,
}

impl LifecycleController {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        factory: Arc<dyn PlayerFactory>,
        emitter: EventEmitter,
        config: SessionConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            registry,
            factory,
            emitter,
            config,
        })
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn find(&self, session_id: SessionId) -> Option<Arc<SessionContext>> {
        self.registry.find(session_id)
    }

    /// Open a new session under a random id
    pub async fn open(
        &self,
        user_id: UserId,
        client_name: Option<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<SessionContext>, ContextError> {
        loop {
            let session_id = SessionId(Uuid::new_v4().as_u64_pair().0);
            match self
                .open_with_id(session_id, user_id, client_name.clone(), Arc::clone(&transport))
                .await
            {
                Err(ContextError::DuplicateSession(_)) => {
                    tracing::debug!(session_id = %session_id, "Session id collision, retrying");
                }
                result => return result,
            }
        }
    }

    /// Open a new session under a caller-chosen id
    pub async fn open_with_id(
        &self,
        session_id: SessionId,
        user_id: UserId,
        client_name: Option<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<SessionContext>, ContextError> {
        let session = Arc::new(SessionContext::new(
            session_id,
            user_id,
            client_name,
            &self.config,
            Arc::clone(&self.factory),
            self.emitter.clone(),
            self.this.clone(),
        ));
        self.registry.register(Arc::clone(&session))?;

        session.dispatcher.attach(transport);
        if let Err(e) = session.send(&ServerMessage::Ready {
            resumed: false,
            session_id,
        }) {
            tracing::warn!(session_id = %session_id, error = %e, "Failed to send ready");
        }

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            client_name = session.client_name().unwrap_or("unknown"),
            "Session opened"
        );
        self.emitter.session_opened(session.as_ref(), false);
        Ok(session)
    }

    /// React to a transport going away.
    ///
    /// Only acts on an OPEN session whose current transport is `attachment`
    /// (or that has none left). Pauses or destroys depending on the session's
    /// resume policy.
    pub async fn on_transport_closed(&self, session_id: SessionId, attachment: u64) {
        let Some(session) = self.registry.find(session_id) else {
            return;
        };
        let mut lifecycle = session.lifecycle.write().await;

        let state = session.state();
        if state != ContextState::Open {
            tracing::debug!(session_id = %session_id, state = %state, "Ignoring close, session not open");
            return;
        }
        if let Some(current) = session.dispatcher.attachment()
            && current != attachment
        {
            tracing::debug!(
                session_id = %session_id,
                attachment,
                current,
                "Ignoring close of a stale transport"
            );
            return;
        }

        if let Some(link) = session.dispatcher.detach() {
            link.abort();
        }

        if !lifecycle.policy.enabled {
            let released = session
                .teardown(lifecycle, None, Some(self.registry.as_ref()))
                .await;
            self.finish_teardown(&session, &released);
            return;
        }

        lifecycle.pause_epoch += 1;
        let epoch = lifecycle.pause_epoch;
        let timeout = lifecycle.policy.timeout;
        session.set_state(ContextState::Resumable);

        let controller = self.this.clone();
        lifecycle.resume_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(controller) = controller.upgrade() {
                controller.expire(session_id, epoch).await;
            }
        }));
        drop(lifecycle);

        tracing::info!(
            session_id = %session_id,
            timeout_secs = timeout.as_secs(),
            "Session paused, waiting for resume"
        );
        self.emitter.session_paused(session.as_ref());
    }

    /// Forward an inbound frame to the event handlers
    pub fn on_transport_message(&self, session_id: SessionId, payload: &str) {
        match self.registry.find(session_id) {
            Some(session) => session.emitter().message_in(session.as_ref(), payload),
            None => {
                tracing::debug!(session_id = %session_id, "Message for unknown session dropped");
            }
        }
    }

    /// Resume a paused session on a new transport
    pub async fn resume(
        &self,
        session_id: SessionId,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<SessionContext>, ContextError> {
        let session = self
            .registry
            .find(session_id)
            .ok_or(ContextError::SessionNotFound(session_id))?;
        self.resume_session(&session, transport).await?;
        Ok(session)
    }

    pub async fn resume_session(
        &self,
        session: &Arc<SessionContext>,
        transport: Arc<dyn Transport>,
    ) -> Result<(), ContextError> {
        let session_id = session.session_id();
        let mut lifecycle = session.lifecycle.write().await;

        match session.state() {
            ContextState::Resumable => {}
            ContextState::Destroyed => return Err(ContextError::SessionDestroyed(session_id)),
            ContextState::Open => {
                return Err(ContextError::InvalidTransition {
                    from: ContextState::Open,
                    to: ContextState::Open,
                });
            }
        }

        if let Some(timer) = lifecycle.resume_timer.take() {
            timer.abort();
        }
        session.dispatcher.attach(transport);
        session.set_state(ContextState::Open);

        // Sent under the lock so nothing queued by a transition lands first
        let players = session.players.snapshot();
        let mut replay = Vec::with_capacity(players.len() + 1);
        replay.push(ServerMessage::Ready {
            resumed: true,
            session_id,
        });
        replay.extend(players.values().map(|handle| ServerMessage::PlayerUpdate {
            guild_id: handle.guild_id(),
            playing: handle.is_playing(),
        }));
        for message in &replay {
            if let Err(e) = session.send(message) {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to replay state after resume");
                break;
            }
        }
        drop(lifecycle);

        tracing::info!(session_id = %session_id, players = players.len(), "Session resumed");
        self.emitter.session_opened(session.as_ref(), true);
        Ok(())
    }

    /// Destroy a session right away, closing its transport normally
    pub async fn destroy(&self, session_id: SessionId) -> Result<(), ContextError> {
        let session = self
            .registry
            .find(session_id)
            .ok_or(ContextError::SessionNotFound(session_id))?;
        self.destroy_session(&session).await
    }

    pub async fn destroy_session(&self, session: &Arc<SessionContext>) -> Result<(), ContextError> {
        let lifecycle = session.lifecycle.write().await;
        if session.state().is_destroyed() {
            return Err(ContextError::SessionDestroyed(session.session_id()));
        }

        let frame = CloseFrame::new(CloseFrame::NORMAL, "Session destroyed");
        let released = session
            .teardown(lifecycle, Some(frame), Some(self.registry.as_ref()))
            .await;
        self.finish_teardown(session, &released);
        Ok(())
    }

    /// Destroy every registered session
    pub async fn shutdown(&self) {
        let sessions = self.registry.sessions();
        tracing::info!(sessions = sessions.len(), "Shutting down sessions");
        for session in sessions {
            match self.destroy_session(&session).await {
                Ok(()) | Err(ContextError::SessionDestroyed(_)) => {}
                Err(e) => {
                    tracing::warn!(session_id = %session.session_id(), error = %e, "Failed to destroy session");
                }
            }
        }
    }

    /// Node-wide counters
    pub fn stats(&self) -> NodeStats {
        let sessions = self.registry.sessions();
        NodeStats {
            sessions: sessions.len(),
            players: sessions.iter().map(|s| s.players.len()).sum(),
            playing_players: sessions.iter().map(|s| s.players.playing_count()).sum(),
        }
    }

    /// Push the current stats to every connected session.
    ///
    /// Returns how many sessions accepted the message.
    pub fn broadcast_stats(&self) -> usize {
        let message = ServerMessage::Stats(self.stats());
        self.registry
            .sessions()
            .iter()
            .filter(|session| session.state() == ContextState::Open)
            .filter(|session| session.send(&message).is_ok())
            .count()
    }

    async fn expire(&self, session_id: SessionId, epoch: u64) {
        let Some(session) = self.registry.find(session_id) else {
            return;
        };
        let mut lifecycle = session.lifecycle.write().await;
        if session.state() != ContextState::Resumable || lifecycle.pause_epoch != epoch {
            tracing::debug!(session_id = %session_id, epoch, "Stale resume timer ignored");
            return;
        }

        // This task is the timer; dropping its handle detaches instead of aborting
        lifecycle.resume_timer = None;
        tracing::info!(session_id = %session_id, "Resume window expired");
        let released = session
            .teardown(lifecycle, None, Some(self.registry.as_ref()))
            .await;
        self.finish_teardown(&session, &released);
    }

    fn finish_teardown(&self, session: &Arc<SessionContext>, released: &[PlayerHandle]) {
        let session_id = session.session_id();
        session.report_teardown(released);
        tracing::info!(
            session_id = %session_id,
            players_released = released.len(),
            "Session destroyed"
        );
    }
}
