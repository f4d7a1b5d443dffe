use serde::{Deserialize, Serialize};

use cadence_core::SessionConfig;
use cadence_server::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_STATS_INTERVAL_SECS};

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCadenceConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub sessions: RawSessionsConfig,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    /// Host for the cadence server
    pub host: Option<String>,

    /// Port for the cadence server
    pub port: Option<u16>,

    /// Seconds between stats pushes
    pub stats_interval_secs: Option<u64>,
}

/// Session defaults as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSessionsConfig {
    pub resuming: Option<bool>,
    pub resume_timeout_secs: Option<u64>,
    pub outbound_queue_capacity: Option<usize>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CadenceConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub stats_interval_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            stats_interval_secs: DEFAULT_STATS_INTERVAL_SECS,
        }
    }
}
