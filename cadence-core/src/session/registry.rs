//! ConnectionRegistry - all live sessions by id
//!
//! Pure bookkeeping: inserting or removing a record never touches the
//! session itself. Teardown is driven by the lifecycle controller.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use cadence_plugin_api::{ContextError, SessionId};

use super::context::SessionContext;

/// Registry of live sessions
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: DashMap<SessionId, Arc<SessionContext>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Insert a new session; fails if the id is taken
    pub fn register(&self, session: Arc<SessionContext>) -> Result<(), ContextError> {
        let session_id = session.session_id();
        match self.sessions.entry(session_id) {
            Entry::Occupied(_) => Err(ContextError::DuplicateSession(session_id)),
            Entry::Vacant(entry) => {
                entry.insert(session);
                tracing::debug!(session_id = %session_id, "Session registered");
                Ok(())
            }
        }
    }

    /// Look up a session, never creating one
    pub fn find(&self, session_id: SessionId) -> Option<Arc<SessionContext>> {
        self.sessions.get(&session_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Drop the record of a session. Removing an unknown id is a no-op.
    pub fn remove(&self, session_id: SessionId) -> Option<Arc<SessionContext>> {
        let removed = self.sessions.remove(&session_id).map(|(_, session)| session);
        if removed.is_some() {
            tracing::debug!(session_id = %session_id, "Session unregistered");
        }
        removed
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Snapshot of all registered sessions
    pub fn sessions(&self) -> Vec<Arc<SessionContext>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
