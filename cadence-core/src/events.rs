//! Fan-out of session events to registered handlers

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use cadence_plugin_api::{PlayerHandle, SessionEventHandler, SocketContext};

/// Dispatches lifecycle events to every [`SessionEventHandler`].
///
/// A panicking handler is logged and skipped; the remaining handlers still
/// run and the session is unaffected.
#[derive(Clone, Default)]
pub struct EventEmitter {
    handlers: Vec<Arc<dyn SessionEventHandler>>,
}

impl EventEmitter {
    pub fn new(handlers: Vec<Arc<dyn SessionEventHandler>>) -> Self {
        Self { handlers }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn session_opened(&self, ctx: &dyn SocketContext, resumed: bool) {
        self.dispatch("session_opened", |h| h.on_session_opened(ctx, resumed));
    }

    pub fn session_paused(&self, ctx: &dyn SocketContext) {
        self.dispatch("session_paused", |h| h.on_session_paused(ctx));
    }

    pub fn session_destroyed(&self, ctx: &dyn SocketContext) {
        self.dispatch("session_destroyed", |h| h.on_session_destroyed(ctx));
    }

    pub fn new_player(&self, ctx: &dyn SocketContext, player: &PlayerHandle) {
        self.dispatch("new_player", |h| h.on_new_player(ctx, player));
    }

    pub fn destroy_player(&self, ctx: &dyn SocketContext, player: &PlayerHandle) {
        self.dispatch("destroy_player", |h| h.on_destroy_player(ctx, player));
    }

    pub fn message_out(&self, ctx: &dyn SocketContext, payload: &str) {
        self.dispatch("message_out", |h| h.on_message_out(ctx, payload));
    }

    pub fn message_in(&self, ctx: &dyn SocketContext, payload: &str) {
        self.dispatch("message_in", |h| h.on_message_in(ctx, payload));
    }

    fn dispatch(&self, event: &'static str, f: impl Fn(&dyn SessionEventHandler)) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| f(handler.as_ref())));
            if result.is_err() {
                tracing::error!(event, "Session event handler panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::mock::{MockPlayerFactory, PanickingHandler, RecordingHandler};
    use crate::session::SessionContext;
    use cadence_plugin_api::{SessionId, UserId};
    use std::sync::Weak;

    fn context() -> SessionContext {
        SessionContext::new(
            SessionId(3),
            UserId(1),
            None,
            &SessionConfig::default(),
            Arc::new(MockPlayerFactory::new()),
            EventEmitter::default(),
            Weak::new(),
        )
    }

    #[test]
    fn every_handler_sees_the_event() {
        let first = Arc::new(RecordingHandler::new());
        let second = Arc::new(RecordingHandler::new());
        let emitter = EventEmitter::new(vec![first.clone(), second.clone()]);

        emitter.session_opened(&context(), false);

        assert_eq!(first.events(), vec!["session_opened:3:false".to_string()]);
        assert_eq!(second.events(), first.events());
    }

    #[test]
    fn panicking_handler_does_not_stop_the_rest() {
        let recorder = Arc::new(RecordingHandler::new());
        let emitter = EventEmitter::new(vec![Arc::new(PanickingHandler), recorder.clone()]);

        emitter.message_out(&context(), "{}");

        assert_eq!(recorder.events(), vec!["message_out:{}".to_string()]);
    }

    #[test]
    fn empty_emitter_is_a_noop() {
        let emitter = EventEmitter::default();
        assert!(emitter.is_empty());
        emitter.session_destroyed(&context());
    }
}
