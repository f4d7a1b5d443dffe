use std::path::{Path, PathBuf};

use anyhow::Result;

use cadence_core::SessionConfig;

use super::types::{
    CadenceConfig, RawCadenceConfig, RawServerConfig, RawSessionsConfig, ServerSection,
};

/// Environment variable naming the project config file
pub const CONFIG_ENV: &str = "CADENCE_CONFIG";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user, then project, then `explicit`)
    pub fn load(explicit: Option<&Path>) -> Result<CadenceConfig> {
        let mut layers: Vec<PathBuf> = Vec::new();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            layers.push(user_path);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            layers.push(project_path);
        }

        // Layer 3: --config must exist if given
        if let Some(path) = explicit {
            layers.push(path.to_path_buf());
        }

        Self::load_layers(&layers)
    }

    /// Merge the given files in order, later files winning
    pub fn load_layers(paths: &[PathBuf]) -> Result<CadenceConfig> {
        let mut raw = RawCadenceConfig::default();
        for path in paths {
            let layer: RawCadenceConfig = cadence_core::config::read_toml(path)?;
            tracing::debug!(path = %path.display(), "Loaded config layer");
            raw = Self::merge_raw(raw, layer);
        }

        // Convert to final config with defaults applied
        Ok(Self::finalize(raw))
    }

    /// Get user config path (`$XDG_CONFIG_HOME/cadence/config.toml` on Linux)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cadence").join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with CADENCE_CONFIG env var
    pub fn project_config_path() -> PathBuf {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from("cadence.toml"),
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawCadenceConfig, overlay: RawCadenceConfig) -> RawCadenceConfig {
        RawCadenceConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
                stats_interval_secs: overlay
                    .server
                    .stats_interval_secs
                    .or(base.server.stats_interval_secs),
            },
            sessions: RawSessionsConfig {
                resuming: overlay.sessions.resuming.or(base.sessions.resuming),
                resume_timeout_secs: overlay
                    .sessions
                    .resume_timeout_secs
                    .or(base.sessions.resume_timeout_secs),
                outbound_queue_capacity: overlay
                    .sessions
                    .outbound_queue_capacity
                    .or(base.sessions.outbound_queue_capacity),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawCadenceConfig) -> CadenceConfig {
        let server_defaults = ServerSection::default();
        let session_defaults = SessionConfig::default();
        CadenceConfig {
            server: ServerSection {
                host: raw.server.host.unwrap_or(server_defaults.host),
                port: raw.server.port.unwrap_or(server_defaults.port),
                stats_interval_secs: raw
                    .server
                    .stats_interval_secs
                    .unwrap_or(server_defaults.stats_interval_secs),
            },
            sessions: SessionConfig {
                resuming: raw.sessions.resuming.unwrap_or(session_defaults.resuming),
                resume_timeout_secs: raw
                    .sessions
                    .resume_timeout_secs
                    .unwrap_or(session_defaults.resume_timeout_secs),
                outbound_queue_capacity: raw
                    .sessions
                    .outbound_queue_capacity
                    .unwrap_or(session_defaults.outbound_queue_capacity),
            },
        }
    }
}
