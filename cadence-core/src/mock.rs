//! Test doubles for transports, players and event handlers
//!
//! Used by the unit tests of this crate, its integration tests and the
//! server tests. Everything records what happened so tests can assert on it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use cadence_plugin_api::{
    CloseFrame, GuildId, Player, PlayerError, PlayerFactory, PlayerHandle, SessionEventHandler,
    SessionId, SocketContext,
};

use crate::transport::{Transport, TransportError};

/// Transport that records every write and close
#[derive(Default)]
pub struct MockTransport {
    written: Mutex<Vec<String>>,
    closes: Mutex<Vec<Option<CloseFrame>>>,
    changed: Notify,
    stalled: bool,
    fail_close: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose writes never complete, like a client that stopped reading
    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::default()
        }
    }

    /// Closing records the frame but then fails
    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn written(&self) -> Vec<String> {
        lock(&self.written).clone()
    }

    /// Written payloads parsed as JSON
    pub fn written_json(&self) -> Vec<serde_json::Value> {
        self.written()
            .iter()
            .map(|payload| serde_json::from_str(payload).unwrap_or(serde_json::Value::Null))
            .collect()
    }

    pub fn closes(&self) -> Vec<Option<CloseFrame>> {
        lock(&self.closes).clone()
    }

    /// Wait until at least `count` payloads were written
    pub async fn wait_for_writes(&self, count: usize) {
        loop {
            let changed = self.changed.notified();
            if lock(&self.written).len() >= count {
                return;
            }
            changed.await;
        }
    }

    /// Wait until the transport was closed at least once
    pub async fn wait_for_close(&self) {
        loop {
            let changed = self.changed.notified();
            if !lock(&self.closes).is_empty() {
                return;
            }
            changed.await;
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&self, payload: String) -> Result<(), TransportError> {
        if self.stalled {
            std::future::pending::<()>().await;
        }
        lock(&self.written).push(payload);
        self.changed.notify_waiters();
        Ok(())
    }

    async fn close(&self, frame: Option<CloseFrame>) -> Result<(), TransportError> {
        lock(&self.closes).push(frame);
        self.changed.notify_waiters();
        if self.fail_close {
            return Err(TransportError::Io("connection reset".to_string()));
        }
        Ok(())
    }
}

/// Player whose playing flag is driven by the factory
pub struct MockPlayer {
    guild_id: GuildId,
    playing: Arc<AtomicBool>,
}

impl Player for MockPlayer {
    fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

/// Factory that counts creations and releases
#[derive(Default)]
pub struct MockPlayerFactory {
    delay: Option<Duration>,
    release_delay: Option<Duration>,
    fail_release: bool,
    created: AtomicUsize,
    released: Mutex<Vec<GuildId>>,
    failing: Mutex<HashSet<GuildId>>,
    playing: Mutex<HashMap<GuildId, Arc<AtomicBool>>>,
}

impl MockPlayerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every construction take this long
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every release take this long
    pub fn with_release_delay(mut self, delay: Duration) -> Self {
        self.release_delay = Some(delay);
        self
    }

    /// Make every release fail after it was recorded
    pub fn with_failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// Number of players built successfully
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Guilds whose players were released, in order
    pub fn released(&self) -> Vec<GuildId> {
        lock(&self.released).clone()
    }

    /// Make construction for this guild fail
    pub fn fail_guild(&self, guild_id: GuildId) {
        lock(&self.failing).insert(guild_id);
    }

    pub fn heal_guild(&self, guild_id: GuildId) {
        lock(&self.failing).remove(&guild_id);
    }

    /// Set the playing flag of the guild's latest player
    pub fn set_playing(&self, guild_id: GuildId, playing: bool) {
        if let Some(flag) = lock(&self.playing).get(&guild_id) {
            flag.store(playing, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl PlayerFactory for MockPlayerFactory {
    async fn create(
        &self,
        _session_id: SessionId,
        guild_id: GuildId,
    ) -> Result<Arc<dyn Player>, PlayerError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if lock(&self.failing).contains(&guild_id) {
            return Err(PlayerError::MediaConnection(format!(
                "no voice server for guild {guild_id}"
            )));
        }

        let playing = Arc::new(AtomicBool::new(false));
        lock(&self.playing).insert(guild_id, Arc::clone(&playing));
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockPlayer { guild_id, playing }))
    }

    async fn destroy(&self, player: Arc<dyn Player>) -> Result<(), PlayerError> {
        if let Some(delay) = self.release_delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.released).push(player.guild_id());
        if self.fail_release {
            return Err(PlayerError::Playback("track would not stop".to_string()));
        }
        Ok(())
    }
}

/// Handler that records events as `name:detail` strings
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        lock(&self.events).clone()
    }

    fn record(&self, event: String) {
        lock(&self.events).push(event);
    }
}

impl SessionEventHandler for RecordingHandler {
    fn on_session_opened(&self, ctx: &dyn SocketContext, resumed: bool) {
        self.record(format!("session_opened:{}:{}", ctx.session_id(), resumed));
    }

    fn on_session_paused(&self, ctx: &dyn SocketContext) {
        self.record(format!("session_paused:{}", ctx.session_id()));
    }

    fn on_session_destroyed(&self, ctx: &dyn SocketContext) {
        self.record(format!("session_destroyed:{}", ctx.session_id()));
    }

    fn on_new_player(&self, _ctx: &dyn SocketContext, player: &PlayerHandle) {
        self.record(format!("new_player:{}", player.guild_id()));
    }

    fn on_destroy_player(&self, _ctx: &dyn SocketContext, player: &PlayerHandle) {
        self.record(format!("destroy_player:{}", player.guild_id()));
    }

    fn on_message_out(&self, _ctx: &dyn SocketContext, payload: &str) {
        self.record(format!("message_out:{payload}"));
    }

    fn on_message_in(&self, _ctx: &dyn SocketContext, payload: &str) {
        self.record(format!("message_in:{payload}"));
    }
}

/// Handler that panics on every event
pub struct PanickingHandler;

impl SessionEventHandler for PanickingHandler {
    fn on_session_opened(&self, _ctx: &dyn SocketContext, _resumed: bool) {
        panic!("handler failure on open");
    }

    fn on_new_player(&self, _ctx: &dyn SocketContext, _player: &PlayerHandle) {
        panic!("handler failure on new player");
    }

    fn on_message_out(&self, _ctx: &dyn SocketContext, _payload: &str) {
        panic!("handler failure on message");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
