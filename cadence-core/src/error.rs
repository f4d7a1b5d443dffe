//! Error types for cadence-core

use std::path::PathBuf;

use thiserror::Error;

pub use cadence_plugin_api::ContextError;

pub use crate::transport::TransportError;

/// Top-level error type for cadence-core
#[derive(Error, Debug)]
pub enum CadenceError {
    #[error("Session error: {0}")]
    Session(#[from] ContextError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from reading configuration files
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_plugin_api::SessionId;

    #[test]
    fn session_error_converts_into_top_level() {
        let err: CadenceError = ContextError::SessionNotFound(SessionId(3)).into();
        assert!(matches!(err, CadenceError::Session(_)));
        assert!(err.to_string().contains("session not found: 3"));
    }

    #[test]
    fn transport_error_displays_correctly() {
        let err: CadenceError = TransportError::Closed.into();
        assert_eq!(err.to_string(), "Transport error: transport closed");
    }

    #[test]
    fn config_error_names_the_file() {
        let err = ConfigError::Read {
            path: PathBuf::from("/etc/cadence.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/etc/cadence.toml"));
        assert!(CadenceError::from(err).to_string().starts_with("Config error"));
    }
}
