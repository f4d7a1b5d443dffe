//! Shared server state

use std::sync::Arc;

use chrono::{DateTime, Utc};

use cadence_core::mock::MockPlayerFactory;
use cadence_core::{ConnectionRegistry, EventEmitter, LifecycleController, SessionConfig};
use cadence_plugin_api::{PlayerFactory, SessionEventHandler};

use crate::player::SilentPlayerFactory;

/// Shared application state accessible from all handlers
pub struct AppState {
    /// Owns every session on the node
    pub controller: Arc<LifecycleController>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state with silent players and no event handlers
    pub fn new(sessions: SessionConfig) -> Self {
        Self::with_components(Arc::new(SilentPlayerFactory), Vec::new(), sessions)
    }

    /// Create state from an explicit player factory and handler set
    pub fn with_components(
        factory: Arc<dyn PlayerFactory>,
        handlers: Vec<Arc<dyn SessionEventHandler>>,
        sessions: SessionConfig,
    ) -> Self {
        let controller = LifecycleController::new(
            Arc::new(ConnectionRegistry::new()),
            factory,
            EventEmitter::new(handlers),
            sessions,
        );
        Self {
            controller,
            started_at: Utc::now(),
        }
    }

    /// Create state backed by a recording mock factory (for testing)
    pub fn new_for_testing(sessions: SessionConfig) -> (Self, Arc<MockPlayerFactory>) {
        let factory = Arc::new(MockPlayerFactory::new());
        let state = Self::with_components(factory.clone(), Vec::new(), sessions);
        (state, factory)
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
