//! Session configuration

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default grace window for resumable sessions, in seconds
pub const DEFAULT_RESUME_TIMEOUT_SECS: u64 = 60;

/// Default bound of each session's outbound queue
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// `[sessions]` section of the node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Whether new sessions survive a lost WebSocket
    pub resuming: bool,

    /// How long a paused session waits for its client to come back
    pub resume_timeout_secs: u64,

    /// Messages buffered per session before sends are rejected
    pub outbound_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resuming: false,
            resume_timeout_secs: DEFAULT_RESUME_TIMEOUT_SECS,
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Resume policy new sessions start with
    pub fn resume_policy(&self) -> ResumePolicy {
        ResumePolicy {
            enabled: self.resuming,
            timeout: Duration::from_secs(self.resume_timeout_secs),
        }
    }

    /// Queue bound, never zero
    pub fn queue_capacity(&self) -> usize {
        self.outbound_queue_capacity.max(1)
    }
}

/// Whether and for how long a session outlives its WebSocket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePolicy {
    pub enabled: bool,
    pub timeout: Duration,
}

impl Default for ResumePolicy {
    fn default() -> Self {
        SessionConfig::default().resume_policy()
    }
}

/// Read and parse one TOML config file
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
